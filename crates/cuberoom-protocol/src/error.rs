//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
///
/// Codec failures carry the original `serde_json::Error` so the exact
/// parse position shows up in logs and in the `Error` replies sent back
/// to clients.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value): malformed JSON,
    /// missing required fields, or an unknown message `type`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, such as a
    /// first message that is not a handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
