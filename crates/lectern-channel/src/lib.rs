//! Connection Manager for Lectern classroom channels.
//!
//! A channel is one logical stream (one room, one concern) to a relay.
//! This crate keeps it alive:
//!
//! 1. **Lifecycle** ([`ConnectionManager`]): open, close, and a bounded
//!    automatic reconnect after unexpected closures
//! 2. **Events** ([`ChannelHandler`], [`Callbacks`]): open, message,
//!    close, error and give-up notifications, delivered in order
//! 3. **Sending** ([`EnvelopeSender`], [`ChannelSender`]): best-effort,
//!    never queued across reconnects
//!
//! [`Role`] lives here too, since both relays gate on it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Relays (above)  ← whiteboard strokes, audio chunks
//!     ↕
//! Channel Layer (this crate)  ← one ConnectionManager per concern
//!     ↕
//! Protocol / Transport (below)  ← Envelope codec, text-frame connections
//! ```

mod config;
mod error;
mod handler;
mod manager;
mod role;

pub use config::{ClosedReason, ConnectionConfig, ConnectionState, ConnectionStatus};
pub use error::ChannelError;
pub use handler::{Callbacks, ChannelHandler};
pub use manager::{ChannelSender, ConnectionManager, EnvelopeSender};
pub use role::Role;
