use crossterm::event::KeyCode;
use ratatui::layout::{Position, Rect, Size};

use crate::ui::surface::Surface;

use super::window::DrawFn;

/// Canvas extent used when none is given. Draw callbacks usually shrink the
/// canvas to what they actually drew.
pub const DEFAULT_CANVAS: Size = Size {
    width: 250,
    height: 250,
};

/// A virtual canvas larger than its window, of which only the part under
/// the viewport is shown. `offset` is the canvas cell shown in the top-left
/// corner of the viewport.
///
/// Every frame draws onto a fresh canvas of the configured size. `extent` is
/// what the last frame left after any resize by the callback, and is what
/// scrolling is limited to.
#[derive(Clone)]
pub struct Pad {
    draw: DrawFn,
    canvas: Size,
    extent: Size,
    offset: Position,
}

impl Pad {
    pub fn new(draw: DrawFn, canvas: Size) -> Self {
        let canvas = Size::new(
            if canvas.width == 0 {
                DEFAULT_CANVAS.width
            } else {
                canvas.width
            },
            if canvas.height == 0 {
                DEFAULT_CANVAS.height
            } else {
                canvas.height
            },
        );
        Self {
            draw,
            canvas,
            extent: canvas,
            offset: Position::ORIGIN,
        }
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn extent(&self) -> Size {
        self.extent
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    fn max_offset(&self, visible: Size) -> Position {
        Position::new(
            self.extent.width.saturating_sub(visible.width),
            self.extent.height.saturating_sub(visible.height),
        )
    }

    fn clamp(&mut self, visible: Size) {
        let max = self.max_offset(visible);
        self.offset = Position::new(self.offset.x.min(max.x), self.offset.y.min(max.y));
    }

    /// Scroll one cell in the arrow's direction without ever showing space
    /// beyond the canvas.
    pub fn pan(&mut self, key: KeyCode, visible: Size) {
        let max = self.max_offset(visible);
        match key {
            KeyCode::Up => self.offset.y = self.offset.y.saturating_sub(1),
            KeyCode::Down if self.offset.y < max.y => self.offset.y += 1,
            KeyCode::Left => self.offset.x = self.offset.x.saturating_sub(1),
            KeyCode::Right if self.offset.x < max.x => self.offset.x += 1,
            _ => {}
        }
        self.clamp(visible);
    }

    /// Redraw the canvas and copy the part under the viewport into the
    /// interior of `surface` (everything inside its one-cell border).
    pub fn render(&mut self, surface: &mut Surface) {
        let mut canvas = Surface::new(Rect::new(0, 0, self.canvas.width, self.canvas.height));
        (self.draw)(&mut canvas);
        self.extent = Size::new(canvas.width(), canvas.height());

        let visible = interior(surface);
        self.clamp(visible);

        let rows = visible
            .height
            .min(self.extent.height.saturating_sub(self.offset.y));
        let cols = visible
            .width
            .min(self.extent.width.saturating_sub(self.offset.x));
        surface.copy_from(&canvas, self.offset.y, self.offset.x, 1, 1, rows, cols);
    }
}

/// Size of the area inside a surface's border.
pub fn interior(surface: &Surface) -> Size {
    Size::new(
        surface.width().saturating_sub(2),
        surface.height().saturating_sub(2),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::style::Style;

    use super::*;

    fn numbered(canvas: &mut Surface) {
        for y in 0..canvas.height() {
            let text: String = (0..canvas.width())
                .map(|x| char::from(b'a' + ((x + y) % 26) as u8))
                .collect();
            canvas.print(y, 0, &text, Style::default());
        }
    }

    fn pad(width: u16, height: u16) -> Pad {
        Pad::new(Arc::new(numbered), Size::new(width, height))
    }

    #[test]
    fn zero_canvas_gets_default_extent() {
        let p = Pad::new(Arc::new(|_: &mut Surface| {}), Size::new(0, 0));
        assert_eq!(p.canvas(), DEFAULT_CANVAS);
        let p = Pad::new(Arc::new(|_: &mut Surface| {}), Size::new(30, 0));
        assert_eq!(p.canvas(), Size::new(30, DEFAULT_CANVAS.height));
    }

    #[test]
    fn panning_stays_inside_canvas() {
        let mut p = pad(10, 10);
        let visible = Size::new(4, 4);

        for _ in 0..20 {
            p.pan(KeyCode::Down, visible);
            p.pan(KeyCode::Right, visible);
        }
        assert_eq!(p.offset(), Position::new(6, 6));

        for _ in 0..20 {
            p.pan(KeyCode::Up, visible);
            p.pan(KeyCode::Left, visible);
        }
        assert_eq!(p.offset(), Position::ORIGIN);
    }

    #[test]
    fn canvas_smaller_than_viewport_never_scrolls() {
        let mut p = pad(3, 2);
        p.pan(KeyCode::Down, Size::new(10, 10));
        p.pan(KeyCode::Right, Size::new(10, 10));
        assert_eq!(p.offset(), Position::ORIGIN);
    }

    #[test]
    fn render_copies_the_viewport() {
        let mut p = pad(10, 10);
        let visible = Size::new(3, 2);
        p.pan(KeyCode::Right, visible);
        p.pan(KeyCode::Down, visible);

        let mut surface = Surface::new(Rect::new(0, 0, 5, 4));
        p.render(&mut surface);
        // Canvas cell (y, x) holds letter (x + y); offset is (1, 1).
        assert_eq!(surface.line(1), " cde ");
        assert_eq!(surface.line(2), " def ");
    }

    #[test]
    fn render_adopts_canvas_resized_by_callback() {
        let draw = |canvas: &mut Surface| {
            canvas.print(0, 0, "tiny", Style::default());
            canvas.resize(1, 4);
        };
        let mut p = Pad::new(Arc::new(draw), Size::new(0, 0));
        let mut surface = Surface::new(Rect::new(0, 0, 10, 5));
        p.render(&mut surface);

        assert_eq!(p.extent(), Size::new(4, 1));
        assert_eq!(p.canvas(), DEFAULT_CANVAS);
        assert_eq!(surface.line(1), " tiny     ");
        p.pan(KeyCode::Down, interior(&surface));
        assert_eq!(p.offset(), Position::ORIGIN);
    }

    #[test]
    fn render_clamps_offset_after_canvas_shrinks() {
        let mut p = pad(20, 20);
        let visible = Size::new(4, 4);
        for _ in 0..10 {
            p.pan(KeyCode::Down, visible);
        }
        assert_eq!(p.offset().y, 10);

        p.draw = Arc::new(|canvas: &mut Surface| canvas.resize(6, 20));
        let mut surface = Surface::new(Rect::new(0, 0, 6, 6));
        p.render(&mut surface);
        assert_eq!(p.offset().y, 2);
    }

    #[test]
    fn growing_content_is_not_clipped_by_an_earlier_shrink() {
        use std::sync::atomic::{AtomicU16, Ordering};

        let lines = Arc::new(AtomicU16::new(2));
        let shared = Arc::clone(&lines);
        let draw = move |canvas: &mut Surface| {
            let n = shared.load(Ordering::Relaxed);
            for y in 0..n {
                canvas.print(y, 0, &format!("row{y}"), Style::default());
            }
            canvas.resize(n, 10);
        };
        let mut p = Pad::new(Arc::new(draw), Size::new(0, 0));
        let mut surface = Surface::new(Rect::new(0, 0, 12, 7));
        p.render(&mut surface);
        assert_eq!(p.extent(), Size::new(10, 2));

        lines.store(5, Ordering::Relaxed);
        let mut surface = Surface::new(Rect::new(0, 0, 12, 7));
        p.render(&mut surface);
        assert_eq!(p.extent(), Size::new(10, 5));
        for y in 0..5u16 {
            assert_eq!(surface.line(y + 1), format!(" row{y}       "));
        }
    }
}
