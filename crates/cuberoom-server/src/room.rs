//! `CubeRoom`: presence and transform relay for one shared scene.
//!
//! The room keeps one [`PlayerTransform`] per member, keyed by session.
//! Joiners get a snapshot of everyone else, movers have their record
//! sparse-merged and their update relayed verbatim to the others, and
//! the legacy cube channel is a pure relay with no memory.

use std::collections::HashMap;

use cuberoom::prelude::*;
use serde::{Deserialize, Serialize};

use crate::messages::{CubeClientMessage, CubeServerMessage};
use crate::transform::{PlayerTransform, SharedCubeState, TransformUpdate};

/// Display name used when the creator picks none, or an empty one.
pub const DEFAULT_ROOM_NAME: &str = "Game Room";

/// Concurrent sessions per room.
pub const MAX_CLIENTS: usize = 10;

/// Join options. `{ "roomName": "..." }`, everything optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeRoomOptions {
    #[serde(rename = "roomName", default)]
    pub room_name: Option<String>,
}

/// Everything one cube room remembers.
#[derive(Debug)]
pub struct CubeRoomState {
    room_id: RoomId,
    name: String,
    players: HashMap<SessionId, PlayerTransform>,
    shared: SharedCubeState,
}

impl CubeRoomState {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored record for `session`, if it is tracked.
    pub fn player(&self, session: &SessionId) -> Option<&PlayerTransform> {
        self.players.get(session)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn shared(&self) -> &SharedCubeState {
        &self.shared
    }

    /// Every tracked record except `session`'s, ordered by session id.
    fn others(&self, session: &SessionId) -> Vec<PlayerTransform> {
        let mut others: Vec<PlayerTransform> = self
            .players
            .values()
            .filter(|p| &p.session_id != session)
            .cloned()
            .collect();
        others.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        others
    }
}

/// The cube room type.
pub struct CubeRoom;

impl RoomLogic for CubeRoom {
    type Options = CubeRoomOptions;
    type State = CubeRoomState;
    type ClientMessage = CubeClientMessage;
    type ServerMessage = CubeServerMessage;

    fn on_create(room_id: RoomId, options: &CubeRoomOptions) -> CubeRoomState {
        let name = options
            .room_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM_NAME.to_string());
        tracing::info!(%room_id, %name, "cube room created");

        CubeRoomState {
            room_id,
            name,
            players: HashMap::new(),
            shared: SharedCubeState::default(),
        }
    }

    fn on_join(
        state: &mut CubeRoomState,
        session: &SessionId,
        _options: &CubeRoomOptions,
    ) -> Outbox<CubeServerMessage> {
        // A repeated id replaces the old record.
        state
            .players
            .insert(session.clone(), PlayerTransform::spawn(session.clone()));

        let players = state.others(session);
        tracing::debug!(
            room_id = %state.room_id,
            %session,
            existing = players.len(),
            "player spawned"
        );

        vec![
            (
                Recipient::Session(session.clone()),
                CubeServerMessage::ExistingPlayers { players },
            ),
            (
                Recipient::AllExcept(session.clone()),
                CubeServerMessage::PlayerJoined {
                    sid: session.clone(),
                },
            ),
        ]
    }

    fn on_message(
        state: &mut CubeRoomState,
        sender: &SessionId,
        msg: CubeClientMessage,
    ) -> Outbox<CubeServerMessage> {
        let relay = match msg {
            CubeClientMessage::PlayerMove(update) => {
                store_move(state, sender, &update);
                CubeServerMessage::RemotePlayerMove {
                    sid: sender.clone(),
                    update,
                }
            }
            CubeClientMessage::MoveCube(update) => CubeServerMessage::MoveCube {
                sid: sender.clone(),
                update,
            },
        };

        vec![(Recipient::AllExcept(sender.clone()), relay)]
    }

    fn on_leave(
        state: &mut CubeRoomState,
        session: &SessionId,
        consented: bool,
    ) -> Outbox<CubeServerMessage> {
        state.players.remove(session);
        tracing::debug!(
            room_id = %state.room_id,
            %session,
            consented,
            remaining = state.players.len(),
            "player removed"
        );

        vec![(
            Recipient::All,
            CubeServerMessage::PlayerLeft {
                sid: session.clone(),
            },
        )]
    }

    fn on_dispose(state: &mut CubeRoomState) {
        state.players.clear();
        tracing::info!(room_id = %state.room_id, "cube room disposed");
    }

    fn display_name(state: &CubeRoomState) -> Option<String> {
        Some(state.name.clone())
    }

    fn room_config() -> RoomConfig {
        RoomConfig {
            max_clients: MAX_CLIENTS,
            ..RoomConfig::default()
        }
    }
}

/// Sparse-merges a move into the sender's record. A sender with no
/// record (move racing a join or leave) is skipped.
fn store_move(
    state: &mut CubeRoomState,
    sender: &SessionId,
    update: &TransformUpdate,
) {
    match state.players.get_mut(sender) {
        Some(record) => record.apply(update),
        None => {
            tracing::debug!(
                room_id = %state.room_id,
                %sender,
                "move from untracked session, not stored"
            );
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
