//! Unified error type for Lectern.

use lectern_audio::AudioError;
use lectern_channel::ChannelError;
use lectern_protocol::ProtocolError;
use lectern_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// Failures while a session is running are reported through callbacks,
/// watched state and [`Notice`](crate::Notice)s; this type covers the
/// calls that can fail up front, such as joining with a bad room id.
#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    /// The room id is empty.
    #[error("invalid room id {0:?}")]
    InvalidRoom(String),

    /// The relay URL does not parse, or is not a `ws://` or `wss://` URL.
    #[error("invalid relay url {url:?}: {reason}")]
    InvalidRelay { url: String, reason: String },
}
