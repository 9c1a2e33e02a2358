//! Rendering surfaces.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A position in surface-local coordinates (not normalized).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Color and width a stroke is drawn with.
///
/// The default is the whiteboard's initial tool: black, 3 units wide.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// CSS-style color string, e.g. `"#ff0000"`.
    pub color: String,
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: "#000000".into(),
            width: 3.0,
        }
    }
}

impl StrokeStyle {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
        }
    }
}

/// Something strokes can be drawn onto.
///
/// Modeled on a 2D canvas context: one ambient style, one current path.
/// Segments added with [`line_to`](Self::line_to) use the style in effect
/// when the path was begun.
pub trait Surface: Send + 'static {
    /// The ambient style new paths are drawn with.
    fn style(&self) -> StrokeStyle;

    fn set_style(&mut self, style: StrokeStyle);

    /// Starts a new path with the pen at `at`.
    fn begin_path(&mut self, at: Point);

    /// Extends the current path to `to`. Without a current path this only
    /// moves the pen.
    fn line_to(&mut self, to: Point);

    /// Finishes the current path. No-op without one.
    fn close_path(&mut self);

    /// Wipes everything, including any path in progress.
    fn clear(&mut self);
}

/// One path as it was drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub style: StrokeStyle,
    pub points: Vec<Point>,
}

/// A [`Surface`] that keeps every path in memory.
///
/// Used by tests and the demo in place of a real canvas.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    style: StrokeStyle,
    finished: Vec<Stroke>,
    current: Option<Stroke>,
    pen: Option<Point>,
    clears: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths that were closed.
    pub fn strokes(&self) -> &[Stroke] {
        &self.finished
    }

    /// The path currently being drawn, if any.
    pub fn current(&self) -> Option<&Stroke> {
        self.current.as_ref()
    }

    /// Where the pen is.
    pub fn pen(&self) -> Option<Point> {
        self.pen
    }

    /// How many times the surface was cleared.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Returns `true` if nothing is drawn.
    pub fn is_blank(&self) -> bool {
        self.finished.is_empty() && self.current.is_none()
    }
}

impl Surface for RecordingSurface {
    fn style(&self) -> StrokeStyle {
        self.style.clone()
    }

    fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    fn begin_path(&mut self, at: Point) {
        // An unclosed path stays visible, as it would on a canvas.
        if let Some(open) = self.current.take() {
            self.finished.push(open);
        }
        self.current = Some(Stroke {
            style: self.style.clone(),
            points: vec![at],
        });
        self.pen = Some(at);
    }

    fn line_to(&mut self, to: Point) {
        if let Some(stroke) = &mut self.current {
            stroke.points.push(to);
        }
        self.pen = Some(to);
    }

    fn close_path(&mut self) {
        if let Some(stroke) = self.current.take() {
            self.finished.push(stroke);
        }
    }

    fn clear(&mut self) {
        self.finished.clear();
        self.current = None;
        self.pen = None;
        self.clears += 1;
    }
}

/// Locks a shared surface. A panic while drawing leaves at worst a
/// half-drawn path, so a poisoned lock is still usable.
pub(crate) fn lock<S: Surface>(surface: &Mutex<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_surface_records_a_closed_path() {
        let mut surface = RecordingSurface::new();
        surface.set_style(StrokeStyle::new("#ff0000", 5.0));
        surface.begin_path(Point::new(1.0, 1.0));
        surface.line_to(Point::new(2.0, 2.0));
        surface.close_path();

        assert_eq!(
            surface.strokes(),
            &[Stroke {
                style: StrokeStyle::new("#ff0000", 5.0),
                points: vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            }]
        );
        assert!(surface.current().is_none());
    }

    #[test]
    fn test_line_to_without_path_only_moves_pen() {
        let mut surface = RecordingSurface::new();
        surface.line_to(Point::new(4.0, 4.0));
        assert!(surface.is_blank());
        assert_eq!(surface.pen(), Some(Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_close_path_without_path_is_noop() {
        let mut surface = RecordingSurface::new();
        surface.close_path();
        assert!(surface.is_blank());
    }

    #[test]
    fn test_begin_path_keeps_unclosed_previous_path() {
        let mut surface = RecordingSurface::new();
        surface.begin_path(Point::new(0.0, 0.0));
        surface.line_to(Point::new(1.0, 0.0));
        surface.begin_path(Point::new(5.0, 5.0));

        assert_eq!(surface.strokes().len(), 1);
        assert_eq!(surface.current().unwrap().points, vec![Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_clear_wipes_everything() {
        let mut surface = RecordingSurface::new();
        surface.begin_path(Point::new(0.0, 0.0));
        surface.close_path();
        surface.begin_path(Point::new(1.0, 1.0));

        surface.clear();
        assert!(surface.is_blank());
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(surface.pen(), None);
    }

    #[test]
    fn test_default_style_is_black_three() {
        let style = StrokeStyle::default();
        assert_eq!(style.color, "#000000");
        assert_eq!(style.width, 3.0);
    }
}
