//! Subscriber side: replaying inbound strokes.

use std::sync::{Arc, Mutex};

use lectern_channel::{ChannelHandler, Role};
use lectern_protocol::{DrawOperation, Envelope, StrokeKind};

use crate::surface::lock;
use crate::{Point, StrokeStyle, Surface};

/// Channel handler for the whiteboard channel.
///
/// - `draw_operation` is replayed onto the surface in the operation's own
///   color and width, then the surface's ambient style is put back. Only
///   subscribers replay; a publisher never draws remote strokes.
/// - `clear_canvas` clears the surface for every role.
/// - Everything else is ignored.
///
/// Usually obtained from [`Whiteboard::remote`](crate::Whiteboard::remote)
/// so it shares the whiteboard's surface.
pub struct RemoteStrokes<S: Surface> {
    role: Role,
    surface: Arc<Mutex<S>>,
}

impl<S: Surface> RemoteStrokes<S> {
    pub fn new(role: Role, surface: Arc<Mutex<S>>) -> Self {
        Self { role, surface }
    }

    /// Draws one remote operation. `move`/`end` without a prior `start`
    /// (a stroke cut by a reconnect) degrade to pen moves and no-ops.
    pub fn replay(&self, op: &DrawOperation) {
        let mut surface = lock(&self.surface);
        let ambient = surface.style();

        surface.set_style(StrokeStyle::new(op.color.clone(), op.stroke_width));
        let at = Point::new(op.x, op.y);
        match op.kind {
            StrokeKind::Start => surface.begin_path(at),
            StrokeKind::Move => surface.line_to(at),
            StrokeKind::End => surface.close_path(),
        }
        surface.set_style(ambient);
    }

    pub fn clear(&self) {
        lock(&self.surface).clear();
    }
}

impl<S: Surface> ChannelHandler for RemoteStrokes<S> {
    fn on_message(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::DrawOperation(op) if self.role.is_subscriber() => {
                self.replay(&op);
            }
            Envelope::DrawOperation(_) => {
                tracing::trace!("publisher ignores remote draw operation");
            }
            Envelope::ClearCanvas => {
                tracing::debug!("remote clear_canvas");
                self.clear();
            }
            other => {
                tracing::trace!(kind = other.kind(), "not a whiteboard envelope");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingSurface;

    fn op(kind: StrokeKind, x: f64, y: f64) -> Envelope {
        Envelope::DrawOperation(DrawOperation {
            kind,
            x,
            y,
            color: "#ff0000".into(),
            stroke_width: 8.0,
        })
    }

    fn handler(role: Role) -> (RemoteStrokes<RecordingSurface>, Arc<Mutex<RecordingSurface>>) {
        let surface = Arc::new(Mutex::new(RecordingSurface::new()));
        (RemoteStrokes::new(role, Arc::clone(&surface)), surface)
    }

    #[test]
    fn test_subscriber_replays_with_carried_style_and_restores_ambient() {
        let (mut remote, surface) = handler(Role::Subscriber);
        let local_tool = StrokeStyle::new("#0000ff", 1.0);
        surface.lock().unwrap().set_style(local_tool.clone());

        remote.on_message(op(StrokeKind::Start, 10.0, 10.0));
        remote.on_message(op(StrokeKind::Move, 20.0, 20.0));
        remote.on_message(op(StrokeKind::End, 20.0, 20.0));

        let surface = surface.lock().unwrap();
        assert_eq!(surface.strokes().len(), 1);
        assert_eq!(surface.strokes()[0].style, StrokeStyle::new("#ff0000", 8.0));
        assert_eq!(
            surface.strokes()[0].points,
            vec![Point::new(10.0, 10.0), Point::new(20.0, 20.0)]
        );
        assert_eq!(surface.style(), local_tool);
    }

    #[test]
    fn test_publisher_ignores_remote_strokes() {
        let (mut remote, surface) = handler(Role::Publisher);
        remote.on_message(op(StrokeKind::Start, 1.0, 1.0));
        remote.on_message(op(StrokeKind::End, 1.0, 1.0));
        assert!(surface.lock().unwrap().is_blank());
    }

    #[test]
    fn test_clear_canvas_applies_to_every_role() {
        for role in [Role::Publisher, Role::Subscriber] {
            let (mut remote, surface) = handler(role);
            {
                let mut s = surface.lock().unwrap();
                s.begin_path(Point::new(0.0, 0.0));
                s.close_path();
            }

            remote.on_message(Envelope::ClearCanvas);

            let s = surface.lock().unwrap();
            assert!(s.is_blank(), "{role}");
            assert_eq!(s.clear_count(), 1);
        }
    }

    #[test]
    fn test_move_without_start_is_tolerated() {
        let (mut remote, surface) = handler(Role::Subscriber);

        remote.on_message(op(StrokeKind::Move, 5.0, 5.0));
        remote.on_message(op(StrokeKind::End, 5.0, 5.0));

        let s = surface.lock().unwrap();
        assert!(s.is_blank());
        assert_eq!(s.pen(), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_other_envelopes_are_ignored() {
        let (mut remote, surface) = handler(Role::Subscriber);
        remote.on_message(Envelope::Text("hello".into()));
        remote.on_message(Envelope::Error);
        assert!(surface.lock().unwrap().is_blank());
    }
}
