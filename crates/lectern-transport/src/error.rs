/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address could not be used to open a connection.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Opening the connection failed (refused, DNS, handshake).
    #[error("connect to {address} failed: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
