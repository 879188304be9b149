//! # Cuberoom
//!
//! Real-time room server framework for small multiplayer games.
//!
//! A room type implements the [`RoomLogic`] trait once; the framework
//! handles transport, sessions, room actors, and delivery. Each room
//! handles one event at a time, so room state needs no locking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cuberoom::prelude::*;
//!
//! // Implement RoomLogic for your room, then:
//! // let server = CuberoomServer::builder()
//! //     .bind("0.0.0.0:2567")
//! //     .room_name("my_room")
//! //     .build::<MyRoom>()
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::CuberoomError;
pub use server::{CuberoomServer, CuberoomServerBuilder, PROTOCOL_VERSION};

/// Everything a room implementation and its server binary need.
pub mod prelude {
    pub use crate::{
        CuberoomError, CuberoomServer, CuberoomServerBuilder, PROTOCOL_VERSION,
    };
    pub use cuberoom_protocol::{
        Channel, Codec, Envelope, JsonCodec, Payload, ProtocolError,
        Recipient, RoomId, RoomListEntry, SessionId, SystemMessage,
    };
    pub use cuberoom_room::{
        Outbox, RoomConfig, RoomError, RoomLifecycle, RoomLogic,
    };
    pub use cuberoom_session::{SessionConfig, SessionError};
    pub use cuberoom_transport::TransportError;
}
