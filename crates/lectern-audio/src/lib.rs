//! Audio-chunk relay for Lectern.
//!
//! The publisher's microphone is cut into short segments; each one is
//! wrapped as a standalone WAV file and sent as an `audio_chunk` envelope
//! as soon as it is complete. Subscribers decode and play every segment
//! on arrival. There is no sequencing and no retransmission: a lost or
//! late segment is a glitch, never a stall.
//!
//! ```text
//! CaptureDevice → AudioPublisher → wav::encode → audio_chunk ─┐
//!                      └→ level meter                          │ relay
//! Speaker ← AudioPlayback ← wav::decode ← audio_chunk ←────────┘
//! ```
//!
//! # Key types
//!
//! - [`CaptureDevice`] / [`Speaker`]: hardware seams
//! - [`AudioPublisher`]: microphone on/off, [`CaptureState`], level meter
//! - [`AudioPlayback`]: channel handler that plays inbound segments
//! - [`PlaybackControls`]: shared volume/mute

mod config;
mod device;
mod error;
pub mod meter;
mod playback;
mod publisher;
pub mod wav;

pub use config::{CaptureConfig, PlaybackConfig};
pub use device::{CaptureDevice, Speaker};
pub use error::AudioError;
pub use playback::{AudioPlayback, PlaybackControls};
pub use publisher::{AudioPublisher, CaptureState};
pub use wav::AudioClip;
