//! Wire protocol for Cuberoom.
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`SessionId`],
//!   [`Recipient`], ...): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session / Room
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Channel, Envelope, Payload, Recipient, RoomId, RoomListEntry, SessionId,
    SystemMessage,
};
