//! Draw-operation relay for Lectern.
//!
//! The publisher's pointer events become `draw_operation` envelopes; a
//! subscriber replays them onto its own surface without disturbing its
//! drawing state.
//!
//! # Key types
//!
//! - [`Surface`]: what strokes are rendered onto (a canvas, a test recorder)
//! - [`RecordingSurface`]: in-memory surface that remembers every path
//! - [`Whiteboard`]: publisher side: pointer input → local stroke + envelope
//! - [`RemoteStrokes`]: subscriber side: a channel handler that replays
//!   inbound strokes and honours `clear_canvas`

mod remote;
mod surface;
mod whiteboard;

pub use remote::RemoteStrokes;
pub use surface::{Point, RecordingSurface, Stroke, StrokeStyle, Surface};
pub use whiteboard::Whiteboard;
