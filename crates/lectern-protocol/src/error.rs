//! Error types for the protocol layer.
//!
//! Each crate in Lectern defines its own error enum. Decoding inbound
//! frames never produces one of these: malformed input degrades to an
//! [`Envelope::Error`](crate::Envelope::Error) or
//! [`Envelope::Text`](crate::Envelope::Text) instead.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an envelope into a frame).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A payload is invalid at the protocol level, e.g. an audio chunk
    /// whose text encoding is not valid base64.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
