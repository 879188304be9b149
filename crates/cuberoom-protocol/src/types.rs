//! Core protocol types for Cuberoom's wire format.
//!
//! Every type here is something that gets serialized, sent over the
//! network, and deserialized on the other side. Game-specific messages
//! are not defined here: they travel as opaque bytes inside
//! [`Payload::Game`] and are decoded by the room that owns them.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identity of one connected client for the lifetime of its connection.
///
/// Session ids are short random strings handed out by the session layer.
/// They are unique among live sessions and are never reused while the
/// connection is open. On the wire a `SessionId` is just the string:
/// `#[serde(transparent)]` turns `SessionId("aB3xY9kQz")` into
/// `"aB3xY9kQz"`, which is what browser and engine clients expect in
/// `sid` fields.
///
/// Not `Copy` (it owns a `String`), so clone it when handing it to
/// another task.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Borrows the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A unique identifier for a room (one isolated multiplayer instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// Room logic never touches connections directly. It returns a list of
/// `(Recipient, ServerMessage)` pairs and the room framework fans each
/// one out to the matching members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every session currently in the room.
    All,

    /// One specific session.
    Session(SessionId),

    /// Every session in the room except this one. This is the
    /// broadcast-with-exclusion used to keep a sender from hearing
    /// its own update echoed back.
    AllExcept(SessionId),
}

impl Recipient {
    /// Returns `true` if a message addressed this way should reach `session`.
    pub fn includes(&self, session: &SessionId) -> bool {
        match self {
            Self::All => true,
            Self::Session(target) => target == session,
            Self::AllExcept(excluded) => excluded != session,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel: delivery guarantees
// ---------------------------------------------------------------------------

/// The delivery guarantee a message travelled with.
///
/// WebSocket delivery is reliable and ordered, so that is the only
/// guarantee on offer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss.
    #[default]
    ReliableOrdered,
}

// ---------------------------------------------------------------------------
// SystemMessage: framework-level messages
// ---------------------------------------------------------------------------

/// A summary of a room returned in lobby listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Display name from the room's metadata.
    pub name: String,
    /// Number of sessions currently in the room.
    pub client_count: usize,
    /// Capacity of the room.
    pub max_clients: usize,
}

/// Messages used by the framework itself (not game-specific).
///
/// These handle connecting, heartbeats, joining and leaving rooms,
/// lobby listings, and errors. `#[serde(tag = "type")]` makes the JSON
/// internally tagged:
///
/// ```text
/// { "type": "JoinOrCreate", "name": "my_room", "options": [] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → Server: first message on every connection.
    /// `version` must match the server's protocol version.
    Handshake { version: u32 },

    /// Server → Client: the connection is accepted and has been given
    /// this session id.
    HandshakeAck {
        session_id: SessionId,
        server_time: u64,
    },

    /// Either direction: "I'm disconnecting."
    Disconnect { reason: String },

    // -- Heartbeat (keep-alive) --
    /// Client → Server: "I'm still here."
    Heartbeat { client_time: u64 },

    /// Server → Client: echo of `client_time` plus the server clock, for
    /// RTT and clock-offset estimation.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    // -- Room management --
    /// Client → Server: "Put me in this specific room."
    /// `options` are the room's join options, encoded with the codec.
    /// Empty means "use defaults".
    JoinRoom { room_id: RoomId, options: Vec<u8> },

    /// Client → Server: "Find me a room of this type or create one."
    /// `name` must match the name the room type is registered under.
    JoinOrCreate { name: String, options: Vec<u8> },

    /// Client → Server: "I'm leaving my room."
    LeaveRoom,

    /// Client → Server: "Show me available rooms."
    ListRooms,

    /// Server → Client: lobby listing.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Server → Client: "You've joined a room."
    RoomJoined {
        room_id: RoomId,
        session_id: SessionId,
    },

    /// Server → Client: the room you were in has been disposed.
    RoomClosed { room_id: RoomId },

    // -- Errors --
    /// Server → Client: "Something went wrong."
    /// `code` follows HTTP conventions (400, 404, 409).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload: what's inside an envelope
// ---------------------------------------------------------------------------

/// The content of a message: either a system message or game data.
///
/// Adjacently tagged, so the framework can route without decoding game
/// data:
///
/// ```text
/// { "type": "System", "data": { "type": "Heartbeat", "client_time": 1 } }
/// { "type": "Game",   "data": [123, 34, 116, ...] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A framework-level message.
    System(SystemMessage),

    /// Room-specific data, opaque to the framework.
    Game(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every frame on the wire is an Envelope.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ seq: 42                          │
/// │ timestamp: 15000                 │
/// │ channel: ReliableOrdered         │
/// │ ┌──────────────────────────────┐ │
/// │ │ payload: Game([...bytes...]) │ │
/// │ └──────────────────────────────┘ │
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-direction sequence number.
    pub seq: u64,

    /// Milliseconds since the connection was accepted.
    pub timestamp: u64,

    /// Delivery guarantee. Defaults to `ReliableOrdered` when absent.
    #[serde(default)]
    pub channel: Channel,

    /// The message content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
