//! The session manager: tracks every live session.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap` wrapper with no internal
//! locking. The server keeps it behind a single `tokio::sync::Mutex`
//! and only holds that lock for the duration of one call.

use std::collections::HashMap;
use std::time::Instant;

use cuberoom_protocol::SessionId;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::{Session, SessionConfig, SessionError};

/// Registry of connected sessions, keyed by id.
///
/// ```text
/// create() ──→ [Connected] ──→ disconnect() ──→ (gone)
/// ```
pub struct SessionManager {
    sessions: HashMap<SessionId, Session>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    /// Creates a session with a fresh random id.
    ///
    /// Candidates that collide with a live session are discarded, so an
    /// id is never handed out twice while its first owner is connected.
    ///
    /// # Errors
    /// Returns [`SessionError::IdSpaceExhausted`] if
    /// `config.max_id_attempts` candidates in a row all collided.
    pub fn create(&mut self) -> Result<Session, SessionError> {
        for _ in 0..self.config.max_id_attempts {
            let session_id = generate_session_id(self.config.id_length);
            if self.sessions.contains_key(&session_id) {
                tracing::debug!(%session_id, "session id collision, retrying");
                continue;
            }

            let session = Session {
                session_id: session_id.clone(),
                connected_at: Instant::now(),
            };
            self.sessions.insert(session_id.clone(), session.clone());
            tracing::info!(%session_id, live = self.sessions.len(), "session created");
            return Ok(session);
        }

        Err(SessionError::IdSpaceExhausted(self.config.max_id_attempts))
    }

    /// Removes a session when its connection ends.
    ///
    /// `consented` records whether the client asked to leave or the
    /// connection simply dropped; it only affects logging here.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no such session is live.
    pub fn disconnect(
        &mut self,
        session_id: &SessionId,
        consented: bool,
    ) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;

        tracing::info!(
            %session_id,
            consented,
            connected_ms = session.age().as_millis() as u64,
            "session closed"
        );
        Ok(session)
    }

    /// Looks up a live session.
    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Returns `true` if the session is live.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Draws a random alphanumeric id of `len` characters.
fn generate_session_id(len: usize) -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect();
    SessionId(id)
}

// =========================================================================
// Tests
// =========================================================================
