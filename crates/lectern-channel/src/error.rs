//! Error types for the channel layer.

use lectern_protocol::ProtocolError;

/// Why an outbound envelope was not handed to the transport.
///
/// Transport failures are not in here: those are non-fatal, reported
/// through [`ChannelHandler::on_error`](crate::ChannelHandler::on_error)
/// and they drive the reconnect state machine instead.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel is not `Open` (connecting, reconnecting or closed).
    /// Sends are never queued for a later connection.
    #[error("channel is not open")]
    NotOpen,

    /// The envelope could not be encoded.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}
