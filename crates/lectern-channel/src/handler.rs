//! The callback contract between a channel and its owner.

use lectern_protocol::Envelope;
use lectern_transport::TransportError;

/// Receives a channel's lifecycle events and inbound envelopes.
///
/// The handler is moved into the channel's driver task on `open()` and
/// every method is called from that one task, one at a time, so an
/// implementation never sees two callbacks interleave. Methods must not
/// block: they run between frames.
///
/// Every method has a no-op default; implement the ones you care about.
pub trait ChannelHandler: Send + 'static {
    /// A connection was established. Fires once per successful connect,
    /// including each successful reconnect.
    fn on_open(&mut self) {}

    /// An inbound frame was decoded. Fires in transport arrival order.
    fn on_message(&mut self, envelope: Envelope) {
        let _ = envelope;
    }

    /// The connection was lost, or a connect attempt failed. Fires before
    /// any reconnect is scheduled. Not fired for an explicit `close()`.
    fn on_close(&mut self) {}

    /// A transport-level error occurred. Non-fatal by itself.
    fn on_error(&mut self, error: &TransportError) {
        let _ = error;
    }

    /// Every reconnect attempt failed and the channel has given up.
    /// Recovery needs a new `open()`.
    fn on_reconnect_exhausted(&mut self) {}
}

/// Ignores every event.
impl ChannelHandler for () {}

type Hook = Box<dyn FnMut() + Send>;

/// A [`ChannelHandler`] assembled from closures.
///
/// ```rust
/// use lectern_channel::Callbacks;
///
/// let handler = Callbacks::new()
///     .on_open(|| println!("connected"))
///     .on_message(|envelope| println!("got {}", envelope.kind()));
/// # let _ = handler;
/// ```
#[derive(Default)]
pub struct Callbacks {
    open: Option<Hook>,
    message: Option<Box<dyn FnMut(Envelope) + Send>>,
    close: Option<Hook>,
    error: Option<Box<dyn FnMut(&TransportError) + Send>>,
    exhausted: Option<Hook>,
}

impl Callbacks {
    /// Creates an empty set; every event is ignored until a hook is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook for [`ChannelHandler::on_open`].
    pub fn on_open(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.open = Some(Box::new(f));
        self
    }

    /// Sets the hook for [`ChannelHandler::on_message`].
    pub fn on_message(
        mut self,
        f: impl FnMut(Envelope) + Send + 'static,
    ) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    /// Sets the hook for [`ChannelHandler::on_close`].
    pub fn on_close(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }

    /// Sets the hook for [`ChannelHandler::on_error`].
    pub fn on_error(
        mut self,
        f: impl FnMut(&TransportError) + Send + 'static,
    ) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the hook for [`ChannelHandler::on_reconnect_exhausted`].
    pub fn on_reconnect_exhausted(
        mut self,
        f: impl FnMut() + Send + 'static,
    ) -> Self {
        self.exhausted = Some(Box::new(f));
        self
    }
}

impl ChannelHandler for Callbacks {
    fn on_open(&mut self) {
        if let Some(f) = &mut self.open {
            f();
        }
    }

    fn on_message(&mut self, envelope: Envelope) {
        if let Some(f) = &mut self.message {
            f(envelope);
        }
    }

    fn on_close(&mut self) {
        if let Some(f) = &mut self.close {
            f();
        }
    }

    fn on_error(&mut self, error: &TransportError) {
        if let Some(f) = &mut self.error {
            f(error);
        }
    }

    fn on_reconnect_exhausted(&mut self) {
        if let Some(f) = &mut self.exhausted {
            f();
        }
    }
}
