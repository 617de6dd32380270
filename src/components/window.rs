use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Result};
use crossterm::event::KeyEvent;
use ratatui::layout::{Position, Rect, Size};

use crate::event::Action;
use crate::model::table::{SortOrder, Table};
use crate::ui::surface::{fit_width, Surface};
use crate::ui::theme::Theme;

use super::pad::Pad;

/// Render callback of draw and pad windows.
pub type DrawFn = Arc<dyn Fn(&mut Surface) + Send + Sync>;

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a window. Clones of a window share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    fn next() -> Self {
        Self(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone)]
pub enum Content {
    Table(Table),
    Draw(DrawFn),
    Pad(Pad),
}

/// A bordered rectangle on screen showing a table, custom drawing, or a
/// scrollable pad. The area includes the border.
#[derive(Clone)]
pub struct Window {
    id: WindowId,
    title: String,
    area: Rect,
    content: Content,
    dismissible: bool,
}

/// Place a `width` x `height` rectangle at `origin` inside `bounds`. Zero
/// means "up to the edge". Anything sticking out is cut off, not rejected.
fn fit_to_bounds(title: &str, origin: Position, width: u16, height: u16, bounds: Size) -> Rect {
    let x = origin.x.min(bounds.width.saturating_sub(1));
    let y = origin.y.min(bounds.height.saturating_sub(1));
    let max_width = bounds.width - x;
    let max_height = bounds.height - y;

    let w = if width == 0 { max_width } else { width.min(max_width) };
    let h = if height == 0 {
        max_height
    } else {
        height.min(max_height)
    };

    if x != origin.x || y != origin.y || w < width || h < height {
        tracing::warn!(
            window = title,
            requested = ?(origin.y, origin.x, height, width),
            trimmed = ?(y, x, h, w),
            "window does not fit the terminal, trimmed"
        );
    }
    Rect::new(x, y, w, h)
}

impl Window {
    /// Window showing `table`, sized to its rows and columns plus border and
    /// header.
    pub fn for_table(table: Table, origin: Position, bounds: Size) -> Result<Self> {
        ensure!(
            table.header().is_some(),
            "table {}: header must be set before creating a window",
            table.name()
        );

        let height = u16::try_from(table.row_count() + 3).unwrap_or(u16::MAX);
        let width = table.width().saturating_add(2);
        let title = table.name().to_string();
        let area = fit_to_bounds(&title, origin, width, height, bounds);

        Ok(Self {
            id: WindowId::next(),
            title,
            area,
            content: Content::Table(table),
            dismissible: false,
        })
    }

    /// Window whose whole surface is painted by `draw`.
    pub fn draw(
        title: impl Into<String>,
        draw: DrawFn,
        width: u16,
        height: u16,
        origin: Position,
        bounds: Size,
    ) -> Self {
        let title = title.into();
        let area = fit_to_bounds(&title, origin, width, height, bounds);
        Self {
            id: WindowId::next(),
            title,
            area,
            content: Content::Draw(draw),
            dismissible: false,
        }
    }

    /// Window showing a scrollable view of a `canvas` sized pad. `viewport`
    /// is the window size including the border.
    pub fn pad(
        title: impl Into<String>,
        draw: DrawFn,
        canvas: Size,
        viewport: Size,
        origin: Position,
        bounds: Size,
    ) -> Self {
        let title = title.into();
        let area = fit_to_bounds(&title, origin, viewport.width, viewport.height, bounds);
        Self {
            id: WindowId::next(),
            title,
            area,
            content: Content::Pad(Pad::new(draw, canvas)),
            dismissible: false,
        }
    }

    /// Quitting while this window is focused closes it instead of the
    /// application.
    pub fn dismissible(mut self) -> Self {
        self.dismissible = true;
        self
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn table(&self) -> Option<&Table> {
        match &self.content {
            Content::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        match &mut self.content {
            Content::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn set_origin(&mut self, origin: Position) {
        self.area.x = origin.x;
        self.area.y = origin.y;
    }

    pub fn hit_test(&self, pos: Position) -> bool {
        self.area.contains(pos)
    }

    /// Column whose header cell lies under `pos`. Only the row right below
    /// the top border counts; the gutter between columns belongs to none.
    pub fn header_hit_test(&self, pos: Position) -> Option<usize> {
        let header = self.table()?.header()?;
        if u32::from(pos.y) != u32::from(self.area.y) + 1 {
            return None;
        }

        let x = u32::from(pos.x);
        let mut start = u32::from(self.area.x) + 1;
        for (idx, cell) in header.cells.iter().enumerate() {
            let end = start + u32::from(cell.width);
            if x >= start && x < end {
                return Some(idx);
            }
            start = end + 1;
        }
        None
    }

    /// Paint the window onto a brand new surface at its current area.
    pub fn populate(&mut self, focused: bool) -> Result<Surface> {
        tracing::trace!(
            window = %self.title,
            kind = self.content.kind(),
            area = ?self.area,
            focused,
            "populating"
        );

        let mut surface = Surface::new(self.area);
        let border = if focused {
            Theme::border_focused()
        } else {
            Theme::border_unfocused()
        };

        match &mut self.content {
            Content::Table(table) => {
                draw_table(table, &mut surface)?;
                surface.draw_box(border);
                surface.print(0, 1, table.name(), Theme::title());
            }
            Content::Draw(draw) => draw(&mut surface),
            Content::Pad(pad) => {
                surface.draw_box(border);
                surface.print(0, 1, &self.title, Theme::title());
                pad.render(&mut surface);
            }
        }
        Ok(surface)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let visible = Size::new(
            self.area.width.saturating_sub(2),
            self.area.height.saturating_sub(2),
        );
        match &mut self.content {
            Content::Pad(pad) => {
                pad.pan(key.code, visible);
                tracing::trace!(
                    window = %self.title,
                    canvas = ?pad.canvas(),
                    extent = ?pad.extent(),
                    offset = ?pad.offset(),
                    "panned"
                );
            }
            _ => tracing::debug!(window = %self.title, key = ?key.code, "key ignored"),
        }
    }

    /// A click on a header cell toggles that column's sort.
    pub fn handle_mouse_click(&mut self, pos: Position) -> Result<()> {
        let Some(idx) = self.header_hit_test(pos) else {
            tracing::debug!(window = %self.title, x = pos.x, y = pos.y, "click");
            return Ok(());
        };
        let Some(table) = self.table_mut() else {
            return Ok(());
        };

        let current = table
            .header()
            .map_or(SortOrder::None, |header| header.cells[idx].sort);
        table.sort(idx, current.toggled())
    }

    pub fn handle_quit(&self) -> Action {
        tracing::debug!(window = %self.title, "quit pressed");
        if self.dismissible {
            Action::Dismiss
        } else {
            Action::Quit
        }
    }
}

fn draw_table(table: &Table, surface: &mut Surface) -> Result<()> {
    let Some(header) = table.header() else {
        return Ok(());
    };

    let mut x: u16 = 1;
    for cell in &header.cells {
        let text = fit_width(&cell.content, usize::from(cell.width));
        surface.print(1, x, &text, Theme::table_header());
        if let Some(glyph) = cell.sort.glyph().filter(|_| cell.width > 0) {
            surface.print(1, x + cell.width - 1, &glyph.to_string(), Theme::sort_marker());
        }
        x = x.saturating_add(cell.width).saturating_add(1);
    }

    // Rows stop above the bottom border.
    let last = surface.height().saturating_sub(1);
    for (y, row) in (2..last).zip(table.rows()) {
        let mut x: u16 = 1;
        for cell in &row.cells {
            ensure!(
                cell.sort == SortOrder::None,
                "table {}: data cell carries a sort marker",
                table.name()
            );
            let text = fit_width(&cell.content, usize::from(cell.width));
            surface.print(y, x, &text, Theme::table_row());
            x = x.saturating_add(cell.width).saturating_add(1);
        }
    }
    Ok(())
}

impl Content {
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Table(_) => "table",
            Content::Draw(_) => "draw",
            Content::Pad(_) => "pad",
        }
    }
}
