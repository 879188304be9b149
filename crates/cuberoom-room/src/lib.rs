//! Room lifecycle management for Cuberoom.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! state and member list and handles one event at a time.
//!
//! # Key types
//!
//! - [`RoomLogic`]: the trait room types implement
//! - [`RoomManager`]: creates/disposes rooms, routes sessions
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomLifecycle`]: Created → Active → Disposing → Disposed
//! - [`RoomConfig`]: capacity, auto-dispose, lobby visibility

mod config;
mod error;
mod logic;
mod manager;
mod room;

pub use config::{RoomConfig, RoomLifecycle};
pub use error::RoomError;
pub use logic::{Outbox, RoomLogic};
pub use manager::{RoomManager, lobby_rooms};
pub use room::{ClientSender, RoomHandle, RoomInfo, RoomOutbound};
