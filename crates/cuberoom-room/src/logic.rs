//! The `RoomLogic` trait, the extension point for room types.
//!
//! A room type implements this trait once. The framework owns the
//! actor, the member list, and delivery; the implementation owns the
//! room's state and decides what to send to whom.

use cuberoom_protocol::{Recipient, RoomId, SessionId};
use serde::{Serialize, de::DeserializeOwned};

use crate::RoomConfig;

/// Outbound messages produced by a hook, each paired with its audience.
pub type Outbox<M> = Vec<(Recipient, M)>;

/// The trait room types implement.
///
/// Associated types:
/// - `Options`: join options sent by clients (the creator's options
///   also configure the room)
/// - `State`: everything the room remembers between events
/// - `ClientMessage`: what sessions send to the room
/// - `ServerMessage`: what the room sends to sessions
///
/// Every hook runs inside the room's actor task, one event at a time,
/// and must not block. The returned [`Outbox`] is delivered in order
/// before the next event is picked up.
pub trait RoomLogic: Send + Sync + 'static {
    /// Join options. An empty options buffer decodes to `Default`.
    type Options: Send + Sync + Clone + Default + Serialize + DeserializeOwned;

    /// Room state. Owned exclusively by the room actor.
    type State: Send + 'static;

    /// Messages that sessions send to the room.
    type ClientMessage: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Messages that the room sends to sessions.
    type ServerMessage: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Builds the initial state when the room is created.
    ///
    /// `options` are the join options of the session whose request
    /// caused the room to be created.
    fn on_create(room_id: RoomId, options: &Self::Options) -> Self::State;

    /// A session has joined. By the time this runs the session is
    /// already a member, so `Recipient::Session(session)` reaches it.
    fn on_join(
        state: &mut Self::State,
        session: &SessionId,
        options: &Self::Options,
    ) -> Outbox<Self::ServerMessage>;

    /// A member sent a message.
    fn on_message(
        state: &mut Self::State,
        sender: &SessionId,
        msg: Self::ClientMessage,
    ) -> Outbox<Self::ServerMessage>;

    /// A session has left. It is no longer a member, so nothing in the
    /// returned outbox can reach it.
    ///
    /// `consented` is `true` when the client asked to leave and `false`
    /// when its connection dropped.
    fn on_leave(
        state: &mut Self::State,
        session: &SessionId,
        consented: bool,
    ) -> Outbox<Self::ServerMessage>;

    /// The room is being torn down. Default: no-op.
    fn on_dispose(_state: &mut Self::State) {}

    /// Display name shown in lobby listings. Default: none.
    fn display_name(_state: &Self::State) -> Option<String> {
        None
    }

    /// Returns the room configuration for this room type.
    fn room_config() -> RoomConfig {
        RoomConfig::default()
    }
}
