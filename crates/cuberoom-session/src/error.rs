//! Error types for the session layer.

use cuberoom_protocol::SessionId;

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live session has this id. Usually a double disconnect.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// Every generated candidate collided with a live session.
    /// Only plausible with a tiny `id_length`.
    #[error("could not generate a unique session id after {0} attempts")]
    IdSpaceExhausted(usize),
}
