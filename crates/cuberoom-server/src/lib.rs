//! Cube room session host.
//!
//! One room type, [`CubeRoom`], served over the Cuberoom framework:
//! clients join a shared scene, see who is already there, and stream
//! their transforms to everyone else. A legacy single-cube channel is
//! relayed alongside.

mod config;
pub mod health;
mod messages;
mod room;
mod transform;

pub use config::ServerConfig;
pub use messages::{CubeClientMessage, CubeServerMessage};
pub use room::{
    CubeRoom, CubeRoomOptions, CubeRoomState, DEFAULT_ROOM_NAME, MAX_CLIENTS,
};
pub use transform::{
    CubeTransform, PlayerTransform, SharedCubeState, TransformUpdate,
};
