//! The Connection Manager: one reconnecting channel to one relay address.
//!
//! Each manager owns a single driver task. That task is the channel's
//! event loop: it connects, pumps frames in both directions, and runs the
//! reconnect state machine. Handler callbacks are invoked from it and only
//! from it, so they never overlap.
//!
//! ```text
//!   owner ── send() ──→ [outbound slot] ──→ driver ──→ Connection
//!   owner ←─ ChannelHandler callbacks ─── driver ←── Connection
//!   owner ←─ watch<ConnectionStatus> ──── driver
//! ```
//!
//! The outbound slot only holds a sender while the channel is `Open`.
//! While connecting or reconnecting it is empty, so sends are dropped
//! on the spot rather than queued for a future connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lectern_protocol::{Codec, Envelope, JsonCodec};
use lectern_transport::{Connection, Connector};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{
    ChannelError, ChannelHandler, ClosedReason, ConnectionConfig,
    ConnectionState, ConnectionStatus,
};

/// How long a graceful close may take before the connection is dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type OutboundSlot = Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>;

fn lock(slot: &OutboundSlot) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn transmit<K: Codec>(
    slot: &OutboundSlot,
    codec: &K,
    envelope: &Envelope,
) -> Result<(), ChannelError> {
    let guard = lock(slot);
    let Some(tx) = guard.as_ref() else {
        return Err(ChannelError::NotOpen);
    };
    let frame = codec.encode(envelope)?;
    // The driver drops its receiver the moment the connection goes away.
    tx.send(frame).map_err(|_| ChannelError::NotOpen)
}

// ---------------------------------------------------------------------------
// EnvelopeSender
// ---------------------------------------------------------------------------

/// Anything envelopes can be published through.
///
/// Implemented by [`ConnectionManager`] and its cloneable
/// [`ChannelSender`] handle. The relays take `&impl EnvelopeSender` so
/// they can be tested without a network.
pub trait EnvelopeSender: Send + Sync {
    /// Hands `envelope` to the transport if the channel is open.
    fn try_send(&self, envelope: &Envelope) -> Result<(), ChannelError>;

    /// Returns `true` while the channel is `Open`.
    fn is_open(&self) -> bool;

    /// Best-effort send. Returns `true` if the envelope was handed to the
    /// transport, `false` if it was dropped.
    fn send(&self, envelope: &Envelope) -> bool {
        match self.try_send(envelope) {
            Ok(()) => true,
            Err(ChannelError::NotOpen) => {
                tracing::debug!(kind = envelope.kind(), "channel not open, envelope dropped");
                false
            }
            Err(e) => {
                tracing::warn!(kind = envelope.kind(), error = %e, "envelope dropped");
                false
            }
        }
    }
}

/// A cloneable handle for sending on a channel from other tasks.
///
/// Obtained from [`ConnectionManager::sender`]. It follows the manager
/// across reconnects and re-opens: whatever connection is open at the
/// moment of the call is the one that carries the envelope.
pub struct ChannelSender<K: Codec = JsonCodec> {
    outbound: OutboundSlot,
    codec: Arc<K>,
}

impl<K: Codec> Clone for ChannelSender<K> {
    fn clone(&self) -> Self {
        Self {
            outbound: Arc::clone(&self.outbound),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<K: Codec> EnvelopeSender for ChannelSender<K> {
    fn try_send(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        transmit(&self.outbound, self.codec.as_ref(), envelope)
    }

    fn is_open(&self) -> bool {
        lock(&self.outbound).is_some()
    }
}

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

struct DriverHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns one logical channel (one room, one concern) and keeps it alive.
///
/// ```rust,no_run
/// use lectern_channel::{Callbacks, ConnectionConfig, ConnectionManager};
/// use lectern_protocol::Envelope;
/// use lectern_transport::WebSocketConnector;
///
/// # async fn run() {
/// let mut channel = ConnectionManager::new(
///     WebSocketConnector::default(),
///     ConnectionConfig::relay(),
/// );
/// channel
///     .open("ws://localhost:9001/?room=math-101-whiteboard", Callbacks::new())
///     .await;
/// channel.send(&Envelope::ClearCanvas);
/// channel.close().await;
/// # }
/// ```
///
/// Dropping the manager stops its driver as if `close()` had been called,
/// without waiting for it.
pub struct ConnectionManager<C: Connector, K: Codec = JsonCodec> {
    connector: Arc<C>,
    codec: Arc<K>,
    config: ConnectionConfig,
    status: Arc<watch::Sender<ConnectionStatus>>,
    outbound: OutboundSlot,
    driver: Option<DriverHandle>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates an idle manager that speaks the JSON envelope format.
    pub fn new(connector: C, config: ConnectionConfig) -> Self {
        Self::with_codec(connector, JsonCodec, config)
    }
}

impl<C: Connector, K: Codec> ConnectionManager<C, K> {
    /// Creates an idle manager with a custom codec.
    pub fn with_codec(connector: C, codec: K, config: ConnectionConfig) -> Self {
        let config = config.validated();
        let (status, _) = watch::channel(ConnectionStatus::initial(&config));
        Self {
            connector: Arc::new(connector),
            codec: Arc::new(codec),
            config,
            status: Arc::new(status),
            outbound: Arc::new(Mutex::new(None)),
            driver: None,
        }
    }

    /// Connects to `address` and starts delivering events to `handler`.
    ///
    /// Returns once the driver is started; the outcome of the connect
    /// arrives through the handler (`on_open`, or `on_error` + `on_close`).
    /// Calling `open` on a manager that is already running tears the old
    /// connection down first; its handler sees no further callbacks.
    pub async fn open(
        &mut self,
        address: impl Into<String>,
        handler: impl ChannelHandler,
    ) {
        self.stop_driver().await;

        let address = address.into();
        self.status.send_modify(|s| {
            s.state = ConnectionState::Connecting;
            s.attempts = 0;
        });
        tracing::info!(%address, "opening channel");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let driver = Driver {
            connector: Arc::clone(&self.connector),
            codec: Arc::clone(&self.codec),
            config: self.config.clone(),
            address,
            status: Arc::clone(&self.status),
            outbound: Arc::clone(&self.outbound),
        };
        let task = tokio::spawn(driver.run(handler, shutdown_rx));

        self.driver = Some(DriverHandle {
            shutdown: shutdown_tx,
            task,
        });
    }

    /// Closes the channel and cancels any pending reconnect.
    ///
    /// Terminal: the channel stays `Closed(ByCaller)` until the next
    /// `open()`. The handler's `on_close` is not called. Safe to call in
    /// any state, including before the first `open()`.
    pub async fn close(&mut self) {
        self.stop_driver().await;
        *lock(&self.outbound) = None;
        self.status.send_modify(|s| {
            s.state = ConnectionState::Closed(ClosedReason::ByCaller);
            s.attempts = 0;
        });
    }

    /// Encodes and sends `envelope`, or says why it could not.
    pub fn try_send(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        transmit(&self.outbound, self.codec.as_ref(), envelope)
    }

    /// Best-effort send; `false` means the envelope was dropped.
    pub fn send(&self, envelope: &Envelope) -> bool {
        EnvelopeSender::send(self, envelope)
    }

    /// A cloneable handle that sends on this channel.
    pub fn sender(&self) -> ChannelSender<K> {
        ChannelSender {
            outbound: Arc::clone(&self.outbound),
            codec: Arc::clone(&self.codec),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Subscribes to status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Returns `true` while the channel is `Open`.
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Returns `true` while the channel is working its way back to `Open`.
    pub fn is_reconnecting(&self) -> bool {
        self.state().is_reconnecting()
    }

    /// The effective configuration (after validation).
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn stop_driver(&mut self) {
        let Some(DriverHandle { shutdown, task }) = self.driver.take() else {
            return;
        };
        // The driver may already have finished (exhausted, disabled).
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            if e.is_panic() {
                tracing::error!("channel driver panicked");
            }
        }
    }
}

impl<C: Connector, K: Codec> EnvelopeSender for ConnectionManager<C, K> {
    fn try_send(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        ConnectionManager::try_send(self, envelope)
    }

    fn is_open(&self) -> bool {
        ConnectionManager::is_open(self)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

enum Ended {
    Shutdown,
    Lost,
}

struct Driver<C: Connector, K: Codec> {
    connector: Arc<C>,
    codec: Arc<K>,
    config: ConnectionConfig,
    address: String,
    status: Arc<watch::Sender<ConnectionStatus>>,
    outbound: OutboundSlot,
}

impl<C: Connector, K: Codec> Driver<C, K> {
    async fn run<H: ChannelHandler>(
        self,
        mut handler: H,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let address = self.address.as_str();
        let mut attempts: u32 = 0;

        loop {
            let connected = tokio::select! {
                biased;
                _ = &mut shutdown => return,
                result = self.connector.connect(address) => result,
            };

            match connected {
                Ok(conn) => {
                    attempts = 0;
                    if let Ended::Shutdown =
                        self.serve(conn, &mut handler, &mut shutdown).await
                    {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(%address, attempts, error = %e, "connect failed");
                    handler.on_error(&e);
                }
            }

            self.publish(ConnectionState::Closed(ClosedReason::Lost), attempts);
            handler.on_close();

            if !self.config.auto_reconnect {
                tracing::info!(%address, "connection lost, reconnect disabled");
                self.publish(
                    ConnectionState::Closed(ClosedReason::ReconnectDisabled),
                    attempts,
                );
                return;
            }

            if attempts >= self.config.max_reconnect_attempts {
                tracing::error!(
                    %address,
                    attempts,
                    "giving up after {} reconnect attempts",
                    self.config.max_reconnect_attempts
                );
                self.publish(
                    ConnectionState::Closed(ClosedReason::Exhausted),
                    attempts,
                );
                handler.on_reconnect_exhausted();
                return;
            }

            self.publish(ConnectionState::Reconnecting, attempts);
            tracing::info!(
                %address,
                attempt = attempts + 1,
                max = self.config.max_reconnect_attempts,
                delay_ms = self.config.reconnect_interval.as_millis() as u64,
                "scheduling reconnect"
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => return,
                _ = tokio::time::sleep(self.config.reconnect_interval) => {}
            }

            attempts += 1;
            self.publish(ConnectionState::Reconnecting, attempts);
        }
    }

    /// Pumps frames until the connection ends or shutdown is requested.
    async fn serve<H: ChannelHandler>(
        &self,
        conn: C::Connection,
        handler: &mut H,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> Ended {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        *lock(&self.outbound) = Some(tx);
        self.publish(ConnectionState::Open, 0);
        tracing::info!(address = %self.address, connection = %conn.id(), "channel open");
        handler.on_open();

        let ended = loop {
            tokio::select! {
                biased;
                _ = &mut *shutdown => break Ended::Shutdown,
                Some(frame) = rx.recv() => {
                    if let Err(e) = conn.send(&frame).await {
                        tracing::warn!(connection = %conn.id(), error = %e, "send failed");
                        handler.on_error(&e);
                        break Ended::Lost;
                    }
                }
                inbound = conn.recv() => match inbound {
                    Ok(Some(frame)) => {
                        let envelope = self.codec.decode(&frame);
                        tracing::trace!(kind = envelope.kind(), "inbound envelope");
                        handler.on_message(envelope);
                    }
                    Ok(None) => {
                        tracing::info!(connection = %conn.id(), "relay closed the connection");
                        break Ended::Lost;
                    }
                    Err(e) => {
                        tracing::warn!(connection = %conn.id(), error = %e, "receive failed");
                        handler.on_error(&e);
                        break Ended::Lost;
                    }
                },
            }
        };

        *lock(&self.outbound) = None;

        if let Ended::Shutdown = ended {
            match tokio::time::timeout(CLOSE_TIMEOUT, conn.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(connection = %conn.id(), error = %e, "close failed");
                }
                Err(_) => {
                    tracing::debug!(connection = %conn.id(), "close timed out");
                }
            }
            tracing::info!(connection = %conn.id(), "channel closed");
        }

        ended
    }

    fn publish(&self, state: ConnectionState, attempts: u32) {
        self.status.send_modify(|s| {
            s.state = state;
            s.attempts = attempts;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use lectern_transport::{ConnectionId, TransportError};

    use super::*;

    /// A connector whose attempts never complete.
    struct Hanging;

    struct Inert;

    impl Connection for Inert {
        async fn send(&self, _frame: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn recv(&self) -> Result<Option<String>, TransportError> {
            pending().await
        }
        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
        fn id(&self) -> ConnectionId {
            ConnectionId::new(0)
        }
    }

    impl Connector for Hanging {
        type Connection = Inert;

        async fn connect(&self, _address: &str) -> Result<Inert, TransportError> {
            pending().await
        }
    }

    #[test]
    fn test_new_manager_is_idle() {
        let manager = ConnectionManager::new(Hanging, ConnectionConfig::default());
        assert_eq!(manager.state(), ConnectionState::Idle);
        assert!(!manager.is_open());
        assert!(!manager.is_reconnecting());
    }

    #[test]
    fn test_new_validates_config() {
        let manager = ConnectionManager::new(
            Hanging,
            ConnectionConfig {
                reconnect_interval: Duration::ZERO,
                ..ConnectionConfig::default()
            },
        );
        assert_eq!(manager.config().reconnect_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_send_before_open_is_dropped() {
        let manager = ConnectionManager::new(Hanging, ConnectionConfig::default());
        assert!(!manager.send(&Envelope::ClearCanvas));
        assert!(matches!(
            manager.try_send(&Envelope::ClearCanvas),
            Err(ChannelError::NotOpen)
        ));
        assert!(!manager.sender().send(&Envelope::ClearCanvas));
    }

    #[tokio::test]
    async fn test_close_before_open_is_terminal() {
        let mut manager = ConnectionManager::new(Hanging, ConnectionConfig::default());
        manager.close().await;
        assert_eq!(
            manager.state(),
            ConnectionState::Closed(ClosedReason::ByCaller)
        );
    }

    #[tokio::test]
    async fn test_close_while_connecting_cancels_attempt() {
        let mut manager = ConnectionManager::new(Hanging, ConnectionConfig::default());
        manager.open("ws://relay.invalid/", ()).await;
        assert_eq!(manager.state(), ConnectionState::Connecting);

        manager.close().await;
        assert_eq!(
            manager.state(),
            ConnectionState::Closed(ClosedReason::ByCaller)
        );
        assert!(!manager.send(&Envelope::ClearCanvas));
    }

    #[tokio::test]
    async fn test_status_receiver_sees_transitions() {
        let mut manager = ConnectionManager::new(Hanging, ConnectionConfig::relay());
        let mut status = manager.status();
        assert_eq!(status.borrow_and_update().max_attempts, 3);

        manager.open("ws://relay.invalid/", ()).await;
        assert!(status.has_changed().unwrap());
        assert_eq!(
            status.borrow_and_update().state,
            ConnectionState::Connecting
        );
    }
}
