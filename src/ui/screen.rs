use anyhow::{anyhow, ensure, Result};
use chrono::Local;
use ratatui::backend::Backend;
use ratatui::layout::{Rect, Size};
use ratatui::Terminal;

use crate::components::status_bar::StatusBar;
use crate::ui::surface::Surface;

/// Surfaces registered for one frame, bottom first. Compositing consumes the
/// stack, so it cannot leak into the next frame.
#[derive(Debug, Default)]
pub struct PanelStack {
    layers: Vec<Surface>,
}

impl PanelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `surface` above everything pushed so far.
    pub fn push(&mut self, surface: Surface) {
        self.layers.push(surface);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.layers.iter()
    }
}

/// The terminal as seen by the window manager: usable bounds, screen
/// clearing, and one atomic composited update per frame. The bottom row is
/// kept for the status bar and never handed out to windows.
pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    bounds: Size,
    status: StatusBar,
}

impl<B: Backend> Screen<B> {
    pub fn new(terminal: Terminal<B>) -> Result<Self> {
        let size = terminal
            .size()
            .map_err(|e| anyhow!("failed to query terminal size: {e}"))?;
        ensure!(
            size.height >= 2 && size.width >= 1,
            "terminal of {}x{} is too small",
            size.width,
            size.height
        );

        Ok(Self {
            terminal,
            bounds: Size::new(size.width, size.height - 1),
            status: StatusBar::new(),
        })
    }

    /// Rows and columns available to windows.
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn status_mut(&mut self) -> &mut StatusBar {
        &mut self.status
    }

    pub fn clear(&mut self) -> Result<()> {
        self.terminal
            .clear()
            .map_err(|e| anyhow!("failed to clear screen: {e}"))
    }

    /// Draw every surface of `stack` in order, later ones on top, followed by
    /// the status bar, as a single screen update.
    pub fn composite(&mut self, stack: PanelStack) -> Result<()> {
        let Self {
            terminal, status, ..
        } = self;
        status.set_refreshed_at(Local::now());
        tracing::trace!(layers = stack.len(), "compositing frame");

        terminal
            .draw(|frame| {
                let area = frame.area();
                let buf = frame.buffer_mut();
                for surface in stack.iter() {
                    surface.blit_into(buf);
                }
                if area.height > 0 {
                    let status_area = Rect::new(area.x, area.bottom() - 1, area.width, 1);
                    status.render(frame, status_area);
                }
            })
            .map_err(|e| anyhow!("failed to draw frame: {e}"))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}
