//! The classroom session: the page-level owner of both channels.

use lectern_audio::{
    AudioError, AudioPlayback, AudioPublisher, CaptureConfig, CaptureDevice, CaptureState,
    PlaybackConfig, PlaybackControls, Speaker,
};
use lectern_channel::{
    ChannelHandler, ConnectionConfig, ConnectionManager, ConnectionStatus, Role,
};
use lectern_protocol::Envelope;
use lectern_transport::{Connector, TransportError};
use lectern_whiteboard::{Point, StrokeStyle, Surface, Whiteboard};
use tokio::sync::{mpsc, watch};

use crate::{ChannelAddress, Concern, LecternError};

/// A user-visible event, for the page to show as a toast or banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A channel opened (first connect or a successful reconnect).
    Connected(Concern),
    /// A channel dropped; a reconnect may follow.
    ConnectionLost(Concern),
    /// A channel gave up reconnecting. Rejoin to recover.
    ReconnectExhausted(Concern),
    /// The microphone failed and was turned off.
    CaptureFailed(String),
}

/// Wraps a relay handler and reports channel lifecycle as [`Notice`]s.
struct Notifying<H> {
    concern: Concern,
    inner: H,
    notices: mpsc::UnboundedSender<Notice>,
}

impl<H: ChannelHandler> Notifying<H> {
    fn new(concern: Concern, inner: H, notices: mpsc::UnboundedSender<Notice>) -> Self {
        Self {
            concern,
            inner,
            notices,
        }
    }

    fn notify(&self, notice: Notice) {
        // The page may have stopped listening; the session keeps going.
        let _ = self.notices.send(notice);
    }
}

impl<H: ChannelHandler> ChannelHandler for Notifying<H> {
    fn on_open(&mut self) {
        self.inner.on_open();
        self.notify(Notice::Connected(self.concern));
    }

    fn on_message(&mut self, envelope: Envelope) {
        self.inner.on_message(envelope);
    }

    fn on_close(&mut self) {
        self.inner.on_close();
        self.notify(Notice::ConnectionLost(self.concern));
    }

    fn on_error(&mut self, error: &TransportError) {
        tracing::debug!(concern = %self.concern, error = %error, "channel error");
        self.inner.on_error(error);
    }

    fn on_reconnect_exhausted(&mut self) {
        self.inner.on_reconnect_exhausted();
        self.notify(Notice::ReconnectExhausted(self.concern));
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and joins a [`ClassroomSession`].
///
/// ```rust,no_run
/// use lectern::prelude::*;
/// # struct Mic;
/// # impl CaptureDevice for Mic {
/// #     fn open(&mut self, _: &CaptureConfig) -> Result<(), AudioError> { Ok(()) }
/// #     async fn read(&mut self, _: std::time::Duration) -> Result<Vec<i16>, AudioError> { Ok(vec![]) }
/// #     fn close(&mut self) {}
/// # }
/// # struct Out;
/// # impl Speaker for Out { fn play(&mut self, _: AudioClip, _: f32) {} }
///
/// # async fn run() -> Result<(), LecternError> {
/// let (mut session, mut notices) = SessionBuilder::new()
///     .relay("wss://relay.example/ws")
///     .room("math-101")
///     .role(Role::Publisher)
///     .join(WebSocketConnector, RecordingSurface::new(), Out, Some(Mic))
///     .await?;
///
/// while let Some(notice) = notices.recv().await {
///     if notice == Notice::Connected(Concern::Audio) {
///         session.microphone_on().await;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    relay: String,
    room: String,
    role: Role,
    connection: ConnectionConfig,
    capture: CaptureConfig,
    playback: PlaybackConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            relay: "ws://localhost:9001/".into(),
            room: String::new(),
            role: Role::Subscriber,
            connection: ConnectionConfig::relay(),
            capture: CaptureConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL of the relay (`ws://` or `wss://`).
    pub fn relay(mut self, url: impl Into<String>) -> Self {
        self.relay = url.into();
        self
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Reconnect settings for both channels. Defaults to
    /// [`ConnectionConfig::relay`].
    pub fn connection_config(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }

    pub fn capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture = config;
        self
    }

    pub fn playback_config(mut self, config: PlaybackConfig) -> Self {
        self.playback = config;
        self
    }

    /// Opens the whiteboard and audio channels and wires the relays to
    /// them. Returns the session and its [`Notice`] stream.
    ///
    /// `microphone` is only used by publishers.
    ///
    /// # Errors
    /// [`LecternError::InvalidRelay`] or [`LecternError::InvalidRoom`] if
    /// the channel addresses cannot be formed. Connection failures are not
    /// errors here; they arrive as notices.
    pub async fn join<C, S, P, D>(
        self,
        connector: C,
        surface: S,
        speaker: P,
        microphone: Option<D>,
    ) -> Result<(ClassroomSession<C, S, D>, mpsc::UnboundedReceiver<Notice>), LecternError>
    where
        C: Connector + Clone,
        S: Surface,
        P: Speaker,
        D: CaptureDevice,
    {
        let board_address = ChannelAddress::new(&self.relay, &self.room, Concern::Whiteboard)?;
        let audio_address = ChannelAddress::new(&self.relay, &self.room, Concern::Audio)?;

        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let board = Whiteboard::new(self.role, surface);
        let playback = PlaybackControls::new(self.playback);

        let mut whiteboard = ConnectionManager::new(connector.clone(), self.connection.clone());
        whiteboard
            .open(
                board_address,
                Notifying::new(Concern::Whiteboard, board.remote(), notices_tx.clone()),
            )
            .await;

        let mut audio = ConnectionManager::new(connector, self.connection);
        audio
            .open(
                audio_address,
                Notifying::new(
                    Concern::Audio,
                    AudioPlayback::new(self.role, speaker, playback.clone()),
                    notices_tx.clone(),
                ),
            )
            .await;

        let microphone = match (self.role, microphone) {
            (Role::Publisher, Some(device)) => {
                let publisher = AudioPublisher::new(device, self.capture);
                tokio::spawn(forward_capture_failures(
                    publisher.state(),
                    notices_tx.clone(),
                ));
                Some(publisher)
            }
            (Role::Publisher, None) => {
                tracing::warn!("publisher joined without a microphone");
                None
            }
            (Role::Subscriber, _) => None,
        };

        tracing::info!(room = %self.room, role = %self.role, "joined classroom");

        let session = ClassroomSession {
            role: self.role,
            room: self.room,
            board,
            whiteboard,
            audio,
            microphone,
            playback,
            notices: notices_tx,
        };
        Ok((session, notices_rx))
    }
}

async fn forward_capture_failures(
    mut state: watch::Receiver<CaptureState>,
    notices: mpsc::UnboundedSender<Notice>,
) {
    while state.changed().await.is_ok() {
        let failed = match &*state.borrow_and_update() {
            CaptureState::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        if let Some(reason) = failed {
            if notices.send(Notice::CaptureFailed(reason)).is_err() {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One participant's live view of a classroom.
///
/// Owns a whiteboard channel and an audio channel to the same room, the
/// local whiteboard surface, the microphone (publishers) and the playback
/// controls (subscribers). Each channel has its own Connection Manager
/// and reconnects independently.
pub struct ClassroomSession<C: Connector, S: Surface, D: CaptureDevice> {
    role: Role,
    room: String,
    board: Whiteboard<S>,
    whiteboard: ConnectionManager<C>,
    audio: ConnectionManager<C>,
    microphone: Option<AudioPublisher<D>>,
    playback: PlaybackControls,
    notices: mpsc::UnboundedSender<Notice>,
}

impl<C: Connector, S: Surface, D: CaptureDevice> ClassroomSession<C, S, D> {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// The local whiteboard, for reading the surface and current tool.
    pub fn whiteboard(&self) -> &Whiteboard<S> {
        &self.board
    }

    pub fn set_tool(&mut self, tool: StrokeStyle) {
        self.board.set_tool(tool);
    }

    /// See [`Whiteboard::pointer_down`].
    pub fn pointer_down(&mut self, at: Point) -> bool {
        self.board.pointer_down(at, &self.whiteboard)
    }

    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.board.pointer_move(at, &self.whiteboard)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.board.pointer_up(&self.whiteboard)
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.board.pointer_leave(&self.whiteboard)
    }

    /// Clears every participant's whiteboard. Publisher only.
    pub fn clear_board(&mut self) -> bool {
        self.board.clear(&self.whiteboard)
    }

    /// Turns the microphone on. Only publishers have one; a subscriber
    /// always gets [`CaptureState::Off`].
    pub async fn microphone_on(&mut self) -> CaptureState {
        match &mut self.microphone {
            Some(microphone) => {
                microphone
                    .start(self.audio.sender(), self.audio.status())
                    .await
            }
            None if self.role.is_publisher() => {
                let reason = AudioError::DeviceUnavailable.to_string();
                let _ = self.notices.send(Notice::CaptureFailed(reason.clone()));
                CaptureState::Failed(reason)
            }
            None => CaptureState::Off,
        }
    }

    pub async fn microphone_off(&mut self) {
        if let Some(microphone) = &mut self.microphone {
            microphone.stop().await;
        }
    }

    /// Microphone state feed, for publishers.
    pub fn capture_state(&self) -> Option<watch::Receiver<CaptureState>> {
        self.microphone.as_ref().map(AudioPublisher::state)
    }

    /// Input level meter feed, for publishers.
    pub fn input_level(&self) -> Option<watch::Receiver<f32>> {
        self.microphone.as_ref().map(AudioPublisher::level)
    }

    /// Volume and mute for incoming audio.
    pub fn playback(&self) -> &PlaybackControls {
        &self.playback
    }

    /// Status feed of one channel.
    pub fn status(&self, concern: Concern) -> watch::Receiver<ConnectionStatus> {
        self.channel(concern).status()
    }

    pub fn is_connected(&self, concern: Concern) -> bool {
        self.channel(concern).is_open()
    }

    pub fn is_reconnecting(&self, concern: Concern) -> bool {
        self.channel(concern).is_reconnecting()
    }

    /// Stops audio capture, then closes both channels.
    pub async fn shutdown(mut self) {
        self.microphone_off().await;
        self.whiteboard.close().await;
        self.audio.close().await;
        tracing::info!(room = %self.room, "left classroom");
    }

    fn channel(&self, concern: Concern) -> &ConnectionManager<C> {
        match concern {
            Concern::Whiteboard => &self.whiteboard,
            Concern::Audio => &self.audio,
        }
    }
}
