//! Publisher side: local pointer input becomes strokes and envelopes.

use std::sync::{Arc, Mutex};

use lectern_channel::{EnvelopeSender, Role};
use lectern_protocol::{DrawOperation, Envelope, StrokeKind};

use crate::surface::lock;
use crate::{Point, RemoteStrokes, StrokeStyle, Surface};

/// A whiteboard as seen by one participant.
///
/// Owns the local [`Surface`] (shared with the [`RemoteStrokes`] handler
/// from [`remote`](Self::remote)) and the selected tool. Pointer methods
/// take the channel to publish on and return whether the envelope was
/// handed to it; the local stroke is drawn either way.
///
/// ```rust
/// use lectern_channel::{EnvelopeSender, ChannelError, Role};
/// use lectern_protocol::Envelope;
/// use lectern_whiteboard::{Point, RecordingSurface, Whiteboard};
///
/// struct Offline;
/// impl EnvelopeSender for Offline {
///     fn try_send(&self, _: &Envelope) -> Result<(), ChannelError> {
///         Err(ChannelError::NotOpen)
///     }
///     fn is_open(&self) -> bool { false }
/// }
///
/// let mut board = Whiteboard::new(Role::Publisher, RecordingSurface::new());
/// assert!(!board.pointer_down(Point::new(10.0, 10.0), &Offline));
/// board.pointer_move(Point::new(20.0, 20.0), &Offline);
/// board.pointer_up(&Offline);
///
/// // Drawn locally even though nothing was sent.
/// assert_eq!(board.with_surface(|s| s.strokes().len()), 1);
/// ```
pub struct Whiteboard<S: Surface> {
    role: Role,
    surface: Arc<Mutex<S>>,
    tool: StrokeStyle,
    /// Last pointer position of the active stroke; `None` when not drawing.
    stroke: Option<Point>,
}

impl<S: Surface> Whiteboard<S> {
    /// Wraps `surface`, selecting the default tool.
    pub fn new(role: Role, mut surface: S) -> Self {
        let tool = StrokeStyle::default();
        surface.set_style(tool.clone());
        Self {
            role,
            surface: Arc::new(Mutex::new(surface)),
            tool,
            stroke: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The selected color and width.
    pub fn tool(&self) -> &StrokeStyle {
        &self.tool
    }

    /// Selects a new color and width for local strokes.
    pub fn set_tool(&mut self, tool: StrokeStyle) {
        lock(&self.surface).set_style(tool.clone());
        self.tool = tool;
    }

    /// Returns `true` between a pointer-down and the matching up/leave.
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// A handler that replays inbound strokes onto this whiteboard's
    /// surface. Install it on the whiteboard channel.
    pub fn remote(&self) -> RemoteStrokes<S> {
        RemoteStrokes::new(self.role, Arc::clone(&self.surface))
    }

    /// Runs `f` with the surface locked.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&lock(&self.surface))
    }

    /// Starts a stroke at `at`.
    pub fn pointer_down(&mut self, at: Point, channel: &impl EnvelopeSender) -> bool {
        if !self.role.is_publisher() {
            return false;
        }

        let sent = channel.send(&self.operation(StrokeKind::Start, at));

        let mut surface = lock(&self.surface);
        surface.set_style(self.tool.clone());
        surface.begin_path(at);
        self.stroke = Some(at);
        sent
    }

    /// Extends the active stroke to `at`. Ignored when not drawing.
    pub fn pointer_move(&mut self, at: Point, channel: &impl EnvelopeSender) -> bool {
        if !self.role.is_publisher() || self.stroke.is_none() {
            return false;
        }

        let sent = channel.send(&self.operation(StrokeKind::Move, at));

        lock(&self.surface).line_to(at);
        self.stroke = Some(at);
        sent
    }

    /// Finishes the active stroke. Emits nothing when not drawing.
    ///
    /// The `end` operation carries the stroke's last position.
    pub fn pointer_up(&mut self, channel: &impl EnvelopeSender) -> bool {
        if !self.role.is_publisher() {
            return false;
        }
        let Some(last) = self.stroke.take() else {
            return false;
        };

        let sent = channel.send(&self.operation(StrokeKind::End, last));

        lock(&self.surface).close_path();
        sent
    }

    /// The pointer left the surface; same as [`pointer_up`](Self::pointer_up).
    pub fn pointer_leave(&mut self, channel: &impl EnvelopeSender) -> bool {
        self.pointer_up(channel)
    }

    /// Clears the local surface and tells every receiver to do the same.
    /// A stroke still in progress is ended first. Publisher only.
    pub fn clear(&mut self, channel: &impl EnvelopeSender) -> bool {
        if !self.role.is_publisher() {
            return false;
        }

        // receivers see `end` before `clear`
        self.pointer_up(channel);
        lock(&self.surface).clear();
        tracing::debug!("whiteboard cleared");
        channel.send(&Envelope::ClearCanvas)
    }

    fn operation(&self, kind: StrokeKind, at: Point) -> Envelope {
        Envelope::DrawOperation(DrawOperation {
            kind,
            x: at.x,
            y: at.y,
            color: self.tool.color.clone(),
            stroke_width: self.tool.width,
        })
    }
}
