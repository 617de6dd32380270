use ratatui::buffer::{self, Buffer};
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};
use unicode_width::UnicodeWidthChar;

/// A rectangular drawing target placed at an absolute screen position.
///
/// All drawing calls take coordinates relative to the surface's top-left
/// corner and are clipped to its extent. Surfaces are cheap and meant to be
/// rebuilt every frame rather than updated in place.
#[derive(Debug, Clone)]
pub struct Surface {
    buf: Buffer,
}

impl Surface {
    pub fn new(area: Rect) -> Self {
        Self {
            buf: Buffer::empty(area),
        }
    }

    pub fn area(&self) -> Rect {
        self.buf.area
    }

    pub fn height(&self) -> u16 {
        self.buf.area.height
    }

    pub fn width(&self) -> u16 {
        self.buf.area.width
    }

    fn absolute(&self, y: u16, x: u16) -> Option<Position> {
        let area = self.buf.area;
        (y < area.height && x < area.width).then(|| Position::new(area.x + x, area.y + y))
    }

    /// Print `text` starting at (`y`, `x`), cut at the right edge.
    pub fn print(&mut self, y: u16, x: u16, text: &str, style: Style) {
        let Some(pos) = self.absolute(y, x) else {
            return;
        };
        let room = usize::from(self.width() - x);
        self.buf.set_stringn(pos.x, pos.y, text, room, style);
    }

    pub fn draw_box(&mut self, style: Style) {
        let area = self.buf.area;
        Block::bordered()
            .border_style(style)
            .render(area, &mut self.buf);
    }

    /// Change the extent, keeping the origin and whatever content still fits.
    pub fn resize(&mut self, height: u16, width: u16) {
        let Rect { x, y, .. } = self.buf.area;
        let old = std::mem::replace(&mut self.buf, Buffer::empty(Rect::new(x, y, width, height)));
        let rows = old.area.height.min(height);
        let cols = old.area.width.min(width);
        let src = Surface { buf: old };
        self.copy_from(&src, 0, 0, 0, 0, rows, cols);
    }

    /// Copy a `rows` x `cols` rectangle of `src` starting at (`src_y`, `src_x`)
    /// into this surface at (`dst_y`, `dst_x`). Cells falling outside either
    /// surface are skipped.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_from(
        &mut self,
        src: &Surface,
        src_y: u16,
        src_x: u16,
        dst_y: u16,
        dst_x: u16,
        rows: u16,
        cols: u16,
    ) {
        for r in 0..rows {
            for c in 0..cols {
                let (Some(sy), Some(sx)) = (src_y.checked_add(r), src_x.checked_add(c)) else {
                    continue;
                };
                let (Some(dy), Some(dx)) = (dst_y.checked_add(r), dst_x.checked_add(c)) else {
                    continue;
                };
                let Some(cell) = src.cell(sy, sx) else {
                    continue;
                };
                if let Some(target) = self.cell_mut(dy, dx) {
                    *target = cell.clone();
                }
            }
        }
    }

    pub fn cell(&self, y: u16, x: u16) -> Option<&buffer::Cell> {
        self.absolute(y, x).and_then(|pos| self.buf.cell(pos))
    }

    fn cell_mut(&mut self, y: u16, x: u16) -> Option<&mut buffer::Cell> {
        self.absolute(y, x).and_then(|pos| self.buf.cell_mut(pos))
    }

    /// Text of row `y`, one symbol per cell.
    #[cfg(test)]
    pub fn line(&self, y: u16) -> String {
        (0..self.width())
            .filter_map(|x| self.cell(y, x))
            .map(|cell| cell.symbol())
            .collect()
    }

    /// Paint this surface onto `dst` at its absolute position. Cells outside
    /// `dst` are dropped.
    pub fn blit_into(&self, dst: &mut Buffer) {
        let area = self.buf.area;
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let pos = Position::new(x, y);
                let (Some(src), Some(target)) = (self.buf.cell(pos), dst.cell_mut(pos)) else {
                    continue;
                };
                *target = src.clone();
            }
        }
    }
}

/// Cut or pad `text` so it takes exactly `width` character cells.
pub fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}
