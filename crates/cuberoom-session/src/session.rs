//! Session types: the server's record of one connected client.

use std::time::{Duration, Instant};

use cuberoom_protocol::SessionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session id generation.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of alphanumeric characters in a generated session id.
    ///
    /// Default: 9. That gives 62^9 (about 1.3 × 10^16) possible ids.
    pub id_length: usize,

    /// How many candidates to draw before giving up on a collision.
    ///
    /// Default: 8.
    pub max_id_attempts: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id_length: 9,
            max_id_attempts: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single connected client.
///
/// Created when the handshake succeeds, removed when the connection
/// closes.
#[derive(Debug, Clone)]
pub struct Session {
    /// The id handed to the client in `HandshakeAck`.
    pub session_id: SessionId,

    /// When the session was created (monotonic clock).
    pub connected_at: Instant,
}

impl Session {
    /// How long this session has been connected.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
