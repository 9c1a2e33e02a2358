//! Transport abstraction layer for Lectern.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! the client side of a text-frame transport. The layers above only ever
//! see whole UTF-8 frames; how they travel is this crate's business.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one physical connection in logs.
///
/// A reconnecting channel goes through several of these; the id tells the
/// attempts apart. Ids are unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static LAST_CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

impl ConnectionId {
    /// Allocates the next process-wide id.
    pub fn next() -> Self {
        Self(LAST_CONNECTION_ID.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Wraps an existing id, for connectors that number their own
    /// connections.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outbound connections to a relay address.
///
/// A connector is stateless from the caller's point of view: every call to
/// [`connect`](Self::connect) yields a fresh, independent connection. The
/// Connection Manager calls it once per attempt.
///
/// The returned futures are `Send` so the manager can drive them from a
/// spawned task.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a connection to `address` and completes the handshake.
    fn connect(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single open connection that exchanges UTF-8 text frames.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame to the remote peer.
    fn send(
        &self,
        frame: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// `Ok(None)` means the peer closed the connection cleanly.
    /// Must be cancel-safe: dropping the future loses no frame.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Starts the closing handshake and drops the link.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// The id this connection is logged under.
    fn id(&self) -> ConnectionId;
}
