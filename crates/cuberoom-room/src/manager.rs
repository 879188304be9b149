//! Room manager: creates, tracks, and routes sessions to rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use cuberoom_protocol::{RoomId, SessionId};

use crate::room::spawn_room;
use crate::{ClientSender, RoomError, RoomHandle, RoomInfo, RoomLogic};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Manages all live rooms of one room type and tracks which session is
/// in which room.
pub struct RoomManager<G: RoomLogic> {
    /// Live rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle<G>>,

    /// Maps each session to the room it is in.
    /// A session is in at most ONE room at a time.
    session_rooms: HashMap<SessionId, RoomId>,
}

impl<G: RoomLogic> RoomManager<G> {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            session_rooms: HashMap::new(),
        }
    }

    /// Creates a new room, configured by `options`, and returns its ID.
    pub fn create_room(&mut self, options: &G::Options) -> RoomId {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room::<G>(
            room_id,
            G::room_config(),
            options,
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Adds a session to a specific room.
    pub async fn join_room(
        &mut self,
        session_id: SessionId,
        room_id: RoomId,
        options: G::Options,
        sender: ClientSender<G>,
    ) -> Result<(), RoomError> {
        self.ensure_roomless(&session_id, Some(room_id))?;

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        handle.join(session_id.clone(), options, sender).await?;
        self.session_rooms.insert(session_id, room_id);
        Ok(())
    }

    /// Finds a listed room with free capacity or creates a new one, then
    /// joins the session to it.
    ///
    /// A newly created room is configured with the joiner's options.
    pub async fn join_or_create(
        &mut self,
        session_id: SessionId,
        options: G::Options,
        sender: ClientSender<G>,
    ) -> Result<RoomId, RoomError> {
        self.ensure_roomless(&session_id, None)?;

        // A room can fill up between get_info and join; keep scanning.
        for handle in self.rooms.values() {
            let Ok(info) = handle.get_info().await else {
                continue;
            };
            if !info.listed || !info.has_capacity() {
                continue;
            }
            if handle
                .join(session_id.clone(), options.clone(), sender.clone())
                .await
                .is_ok()
            {
                self.session_rooms.insert(session_id, info.room_id);
                return Ok(info.room_id);
            }
        }

        let room_id = self.create_room(&options);
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.join(session_id.clone(), options, sender).await?;
        self.session_rooms.insert(session_id, room_id);
        Ok(room_id)
    }

    /// Removes a session from its current room.
    ///
    /// If that leaves the room empty and the room type has
    /// `auto_dispose` set, the room is disposed and forgotten.
    pub async fn leave_room(
        &mut self,
        session_id: &SessionId,
        consented: bool,
    ) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .remove(session_id)
            .ok_or_else(|| RoomError::NoRoom(session_id.clone()))?;

        let Some(handle) = self.rooms.get(&room_id) else {
            return Ok(());
        };

        let remaining = handle.leave(session_id.clone(), consented).await?;
        if remaining == 0 && G::room_config().auto_dispose {
            tracing::debug!(%room_id, "last client left, disposing");
            self.destroy_room(room_id).await?;
        }
        Ok(())
    }

    /// Routes a client message to the sender's current room.
    pub async fn route_message(
        &self,
        session_id: &SessionId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .get(session_id)
            .ok_or_else(|| RoomError::NoRoom(session_id.clone()))?;

        let handle = self
            .rooms
            .get(room_id)
            .ok_or(RoomError::NotFound(*room_id))?;

        handle.send_message(session_id.clone(), msg).await
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(
        &self,
        room_id: RoomId,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.get_info().await
    }

    /// Disposes a room and drops all of its sessions from the index.
    pub async fn destroy_room(
        &mut self,
        room_id: RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        if let Err(e) = handle.dispose().await {
            tracing::debug!(%room_id, error = %e, "room already gone");
        }

        self.session_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room a session is currently in, if any.
    pub fn session_room(&self, session_id: &SessionId) -> Option<RoomId> {
        self.session_rooms.get(session_id).copied()
    }

    /// Lists rooms for the lobby. See [`lobby_rooms`].
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        lobby_rooms(&self.room_handles()).await
    }

    /// Returns cloned handles to all live rooms.
    ///
    /// Lets callers query rooms without holding the manager lock.
    pub fn room_handles(&self) -> Vec<RoomHandle<G>> {
        self.rooms.values().cloned().collect()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Fails if the session is already in a room. `target` only picks
    /// the more specific error when it is the same room.
    fn ensure_roomless(
        &self,
        session_id: &SessionId,
        target: Option<RoomId>,
    ) -> Result<(), RoomError> {
        match self.session_rooms.get(session_id) {
            None => Ok(()),
            Some(current) if Some(*current) == target => {
                Err(RoomError::AlreadyInRoom(session_id.clone(), *current))
            }
            Some(current) => Err(RoomError::InvalidState(format!(
                "session {session_id} is already in room {current}"
            ))),
        }
    }
}

/// Asks each room for its info and keeps the ones a lobby should show:
/// listed, active, and not full.
///
/// Works on handles from [`RoomManager::room_handles`], so the manager
/// lock can be released before any room is queried. Rooms that fail to
/// respond (e.g. disposed since the handles were taken) are skipped.
pub async fn lobby_rooms<G: RoomLogic>(
    handles: &[RoomHandle<G>],
) -> Vec<RoomInfo> {
    let mut infos = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(info) = handle.get_info().await {
            if info.listed && info.has_capacity() {
                infos.push(info);
            }
        }
    }
    infos
}

impl<G: RoomLogic> Default for RoomManager<G> {
    fn default() -> Self {
        Self::new()
    }
}
