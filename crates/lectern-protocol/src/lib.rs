//! Wire protocol for Lectern classroom channels.
//!
//! - **Types** ([`Envelope`], [`DrawOperation`], [`AudioChunk`]): the
//!   closed set of events that travel on a channel.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how an envelope becomes
//!   one text frame, and how any inbound frame becomes an envelope.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding.
//!
//! ```text
//! Transport (text frames) → Protocol (Envelope) → Channel (callbacks)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{AudioChunk, DrawOperation, Envelope, StrokeKind, tag};
