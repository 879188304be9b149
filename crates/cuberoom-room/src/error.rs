//! Error types for the room layer.

use cuberoom_protocol::{RoomId, SessionId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room already holds `max_clients` sessions.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The session is already in this room.
    #[error("session {0} already in room {1}")]
    AlreadyInRoom(SessionId, RoomId),

    /// The session is not in this room.
    #[error("session {0} not in room {1}")]
    NotInRoom(SessionId, RoomId),

    /// The session has not joined any room.
    #[error("session {0} is not in any room")]
    NoRoom(SessionId),

    /// The operation is not allowed right now, e.g. joining a room
    /// that is being disposed.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The room actor is gone or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
