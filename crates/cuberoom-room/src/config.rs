//! Room configuration and lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room type.
///
/// Room types override these defaults in `RoomLogic::room_config()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum concurrent sessions. Joins beyond this are rejected
    /// before the room logic sees them.
    pub max_clients: usize,

    /// Dispose the room as soon as its last client leaves.
    pub auto_dispose: bool,

    /// Whether the room shows up in lobby listings.
    pub listed: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_clients: 8,
            auto_dispose: true,
            listed: true,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomLifecycle
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered, with no way back from `Disposed`:
///
/// ```text
/// Created → Active → Disposing → Disposed
/// ```
///
/// - **Created**: the room logic has built its initial state; the actor
///   has not started yet.
/// - **Active**: the actor is processing join, message, and leave
///   events one at a time.
/// - **Disposing**: teardown has begun; `on_dispose` is running and no
///   further events are accepted.
/// - **Disposed**: state is cleared and the actor task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomLifecycle {
    Created,
    Active,
    Disposing,
    Disposed,
}

impl RoomLifecycle {
    /// Returns `true` if join/message/leave events may be handled.
    pub fn accepts_events(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The next state, or `None` from `Disposed`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Active),
            Self::Active => Some(Self::Disposing),
            Self::Disposing => Some(Self::Disposed),
            Self::Disposed => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal single step.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Active => write!(f, "Active"),
            Self::Disposing => write!(f, "Disposing"),
            Self::Disposed => write!(f, "Disposed"),
        }
    }
}
