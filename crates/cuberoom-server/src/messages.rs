//! Game messages carried inside `Payload::Game`.
//!
//! Both enums are internally tagged by `type`:
//!
//! ```text
//! → { "type": "playerMove", "x": 1.5, "ry": 90 }
//! ← { "type": "remotePlayerMove", "sid": "aB3xY9kQz", "x": 1.5, "ry": 90 }
//! ```

use cuberoom::prelude::SessionId;
use serde::{Deserialize, Serialize};

use crate::transform::{PlayerTransform, TransformUpdate};

/// Messages a client sends to its cube room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CubeClientMessage {
    /// Legacy single-cube move. Relayed as-is, never stored.
    MoveCube(TransformUpdate),

    /// The sender's own pose changed. Any subset of fields.
    PlayerMove(TransformUpdate),
}

/// Messages the cube room sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CubeServerMessage {
    /// Snapshot for a joiner: everyone else, as of the join.
    ExistingPlayers { players: Vec<PlayerTransform> },

    PlayerJoined { sid: SessionId },

    /// Exactly the fields the mover sent, not its merged record.
    RemotePlayerMove {
        sid: SessionId,
        #[serde(flatten)]
        update: TransformUpdate,
    },

    MoveCube {
        sid: SessionId,
        #[serde(flatten)]
        update: TransformUpdate,
    },

    PlayerLeft { sid: SessionId },
}
