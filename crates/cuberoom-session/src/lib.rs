//! Session identity for Cuberoom.
//!
//! Every accepted connection gets exactly one session: a short random
//! [`SessionId`](cuberoom_protocol::SessionId) that rooms use to key
//! their per-client state. Sessions end when the connection ends;
//! there is no resumption.
//!
//! ```text
//! Room Layer (above)     ← keys player state by SessionId
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below) ← provides the SessionId type
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig};
