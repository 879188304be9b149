//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec turns Rust values into bytes and back. The framework only
//! depends on the [`Codec`] trait, so envelopes, join options, and room
//! messages all go through whichever codec the server was built with.
//! [`JsonCodec`] is the only implementation today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Like [`decode`](Self::decode), but an empty buffer yields
    /// `T::default()`.
    ///
    /// Join options are optional on the wire; clients that have nothing
    /// to say send an empty byte string.
    fn decode_or_default<T: DeserializeOwned + Default>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        if data.is_empty() {
            return Ok(T::default());
        }
        self.decode(data)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use cuberoom_protocol::{Channel, Codec, Envelope, JsonCodec, Payload, SystemMessage};
///
/// let codec = JsonCodec;
///
/// let envelope = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     channel: Channel::ReliableOrdered,
///     payload: Payload::System(SystemMessage::Heartbeat { client_time: 5000 }),
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Options {
        #[serde(rename = "roomName")]
        room_name: Option<String>,
    }

    #[test]
    fn test_decode_or_default_empty_buffer_gives_default() {
        let opts: Options = JsonCodec.decode_or_default(&[]).unwrap();
        assert_eq!(opts, Options::default());
    }

    #[test]
    fn test_decode_or_default_parses_non_empty_buffer() {
        let opts: Options = JsonCodec
            .decode_or_default(br#"{"roomName":"Lobby A"}"#)
            .unwrap();
        assert_eq!(opts.room_name.as_deref(), Some("Lobby A"));
    }

    #[test]
    fn test_decode_or_default_still_rejects_garbage() {
        let result: Result<Options, _> = JsonCodec.decode_or_default(b"{{");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
