//! # Lectern
//!
//! Real-time sync layer for a live classroom.
//!
//! One publisher (the teacher) draws on a shared whiteboard and speaks;
//! any number of subscribers (students) see the strokes and hear the audio
//! as they happen. Everything travels through a relay that forwards each
//! frame to the other participants of the same room. Each room has two
//! independent channels, one for the whiteboard and one for audio, and
//! each channel reconnects on its own with a bounded number of attempts.
//!
//! The page supplies the pieces that touch the outside world: a drawing
//! [`Surface`](lectern_whiteboard::Surface), a
//! [`Speaker`](lectern_audio::Speaker) and, for the publisher, a
//! [`CaptureDevice`](lectern_audio::CaptureDevice).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lectern::prelude::*;
//! # struct Out;
//! # impl Speaker for Out { fn play(&mut self, _: AudioClip, _: f32) {} }
//! # struct NoMic;
//! # impl CaptureDevice for NoMic {
//! #     fn open(&mut self, _: &CaptureConfig) -> Result<(), AudioError> { Err(AudioError::DeviceUnavailable) }
//! #     async fn read(&mut self, _: std::time::Duration) -> Result<Vec<i16>, AudioError> { Ok(vec![]) }
//! #     fn close(&mut self) {}
//! # }
//!
//! # async fn run() -> Result<(), LecternError> {
//! let (session, mut notices) = SessionBuilder::new()
//!     .relay("ws://localhost:9001/")
//!     .room("math-101")
//!     .role(Role::Subscriber)
//!     .join(WebSocketConnector, RecordingSurface::new(), Out, None::<NoMic>)
//!     .await?;
//!
//! while let Some(notice) = notices.recv().await {
//!     println!("{notice:?}");
//! }
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod address;
mod error;
mod session;

pub use address::{ChannelAddress, Concern};
pub use error::LecternError;
pub use session::{ClassroomSession, Notice, SessionBuilder};

pub use lectern_audio as audio;
pub use lectern_channel as channel;
pub use lectern_protocol as protocol;
pub use lectern_transport as transport;
pub use lectern_whiteboard as whiteboard;

pub use lectern_channel::Role;

/// Common imports for joining and driving a classroom session.
pub mod prelude {
    pub use crate::{
        ChannelAddress, ClassroomSession, Concern, LecternError, Notice, Role, SessionBuilder,
    };

    pub use lectern_audio::{
        AudioClip, AudioError, AudioPlayback, AudioPublisher, CaptureConfig, CaptureDevice,
        CaptureState, PlaybackConfig, PlaybackControls, Speaker,
    };
    pub use lectern_channel::{
        Callbacks, ChannelError, ChannelHandler, ConnectionConfig, ConnectionManager,
        ConnectionState, ConnectionStatus, EnvelopeSender,
    };
    pub use lectern_protocol::{
        AudioChunk, Codec, DrawOperation, Envelope, JsonCodec, ProtocolError, StrokeKind,
    };
    pub use lectern_transport::{Connection, Connector, TransportError, WebSocketConnector};
    pub use lectern_whiteboard::{
        Point, RecordingSurface, RemoteStrokes, Stroke, StrokeStyle, Surface, Whiteboard,
    };
}
