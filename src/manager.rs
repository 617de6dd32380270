use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{bail, ensure, Result};
use crossterm::event::KeyEvent;
use ratatui::backend::Backend;
use ratatui::layout::{Position, Size};

use crate::components::help::help_window;
use crate::components::window::{Window, WindowId};
use crate::event::{key_action, Action, Inputs, MouseInput};
use crate::source::DataSource;
use crate::ui::screen::{PanelStack, Screen};

/// Progress of a left-button gesture. `target` is the window under the
/// press, `None` when the press hit empty screen. It follows the window
/// while the stack is reordered during the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Pressed {
        target: Option<WindowId>,
        press: Position,
    },
    Dragging {
        target: Option<WindowId>,
        press: Position,
        last: Position,
    },
}

/// How a completed gesture was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Clicked,
    Moved,
}

/// A press released at the very point it started is a click, whatever
/// happened in between.
pub fn is_click(press: Position, release: Position) -> bool {
    press == release
}

/// Shift `origin` by (`dx`, `dy`) keeping a `size` rectangle fully inside
/// `bounds`.
fn translate_within(origin: Position, dx: i32, dy: i32, size: Size, bounds: Size) -> Position {
    let max_x = i32::from(bounds.width.saturating_sub(size.width));
    let max_y = i32::from(bounds.height.saturating_sub(size.height));
    let x = (i32::from(origin.x) + dx).clamp(0, max_x);
    let y = (i32::from(origin.y) + dy).clamp(0, max_y);
    // Both values are within 0..=u16::MAX after clamping.
    Position::new(x as u16, y as u16)
}

/// Owns the window stack and drives input and rendering.
///
/// Index 0 of the stack is the topmost window and has the focus. Windows
/// added later enter at the bottom. The help overlay, while shown, sits
/// above the whole stack and takes the focus.
pub struct WindowManager<B: Backend> {
    screen: Screen<B>,
    windows: Vec<Window>,
    help: Option<Window>,
    gesture: Gesture,
}

impl<B: Backend> WindowManager<B> {
    pub fn new(screen: Screen<B>) -> Self {
        Self {
            screen,
            windows: Vec::new(),
            help: None,
            gesture: Gesture::Idle,
        }
    }

    /// Space available to windows.
    pub fn bounds(&self) -> Size {
        self.screen.bounds()
    }

    pub fn screen_mut(&mut self) -> &mut Screen<B> {
        &mut self.screen
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_help_shown(&self) -> bool {
        self.help.is_some()
    }

    /// Put `window` at the bottom of the stack.
    pub fn add(&mut self, window: Window) -> Result<()> {
        ensure!(
            !self.windows.iter().any(|w| w.id() == window.id()),
            "window {} is already managed",
            window.title()
        );
        tracing::debug!(window = window.title(), area = ?window.area(), "adding window");
        self.windows.push(window);
        Ok(())
    }

    pub fn focused(&self) -> Option<&Window> {
        self.help.as_ref().or_else(|| self.windows.first())
    }

    fn focused_mut(&mut self) -> Option<&mut Window> {
        match &mut self.help {
            Some(help) => Some(help),
            None => self.windows.first_mut(),
        }
    }

    pub fn show_help(&mut self) -> Result<()> {
        if self.help.is_none() {
            self.help = Some(help_window(self.bounds()));
            // Only once; later calls repaint over the previous frame.
            self.screen.clear()?;
        }
        self.refresh_all()
    }

    pub fn close_help(&mut self) -> Result<()> {
        self.help = None;
        self.screen.clear()
    }

    /// Send the focused window to the bottom; everything else moves up one.
    pub fn rotate_focus(&mut self) {
        if self.windows.len() < 2 {
            return;
        }
        self.windows.rotate_left(1);
        tracing::debug!(focused = self.windows[0].title(), "focus rotated");
    }

    /// Stack index of the topmost window covering `pos`.
    pub fn find_window_at(&self, pos: Position) -> Option<usize> {
        self.windows.iter().position(|w| w.hit_test(pos))
    }

    /// A click on the focused window goes to that window. A click on any
    /// other window raises it to the top.
    pub fn focus_on_click(&mut self, pos: Position) -> Result<()> {
        match self.find_window_at(pos) {
            None => Ok(()),
            Some(0) => self.windows[0].handle_mouse_click(pos),
            Some(idx) => {
                let window = self.windows.remove(idx);
                tracing::debug!(window = window.title(), from = idx, "raising window");
                self.windows.insert(0, window);
                self.refresh_all()
            }
        }
    }

    pub fn press(&mut self, pos: Position) -> Result<()> {
        ensure!(
            self.gesture == Gesture::Idle,
            "mouse press at ({}, {}) while a press is in progress",
            pos.y,
            pos.x
        );
        let target = self.find_window_at(pos).map(|idx| self.windows[idx].id());
        self.gesture = Gesture::Pressed { target, press: pos };
        Ok(())
    }

    /// Move the pressed window by the distance travelled since the previous
    /// press or drag event.
    pub fn drag(&mut self, pos: Position) {
        let (target, press, last) = match self.gesture {
            Gesture::Idle => {
                tracing::debug!(x = pos.x, y = pos.y, "drag without press ignored");
                return;
            }
            Gesture::Pressed { target, press } => (target, press, press),
            Gesture::Dragging {
                target,
                press,
                last,
            } => (target, press, last),
        };

        let bounds = self.bounds();
        let window = target.and_then(|id| self.windows.iter_mut().find(|w| w.id() == id));
        if let Some(window) = window {
            let dx = i32::from(pos.x) - i32::from(last.x);
            let dy = i32::from(pos.y) - i32::from(last.y);
            let area = window.area();
            let origin = translate_within(area.as_position(), dx, dy, area.as_size(), bounds);
            window.set_origin(origin);
        }

        self.gesture = Gesture::Dragging {
            target,
            press,
            last: pos,
        };
    }

    /// End the gesture. The state is back to idle even when handling the
    /// click fails.
    pub fn release(&mut self, pos: Position) -> Result<ReleaseOutcome> {
        let press = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => bail!("mouse release at ({}, {}) without a press", pos.y, pos.x),
            Gesture::Pressed { press, .. } | Gesture::Dragging { press, .. } => press,
        };

        if is_click(press, pos) {
            self.focus_on_click(pos)?;
            Ok(ReleaseOutcome::Clicked)
        } else {
            Ok(ReleaseOutcome::Moved)
        }
    }

    pub fn handle_mouse(&mut self, input: MouseInput) -> Result<()> {
        tracing::trace!(?input, gesture = ?self.gesture(), "mouse");
        match input {
            MouseInput::Click(pos) => self.focus_on_click(pos),
            MouseInput::Press(pos) => self.press(pos),
            MouseInput::Drag(pos) => {
                self.drag(pos);
                Ok(())
            }
            MouseInput::Release(pos) => self.release(pos).map(|_| ()),
        }
    }

    /// Dispatch a key press. Returns `true` when the application should end.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key_action(&key) {
            Some(Action::Quit | Action::Dismiss) => self.quit(),
            Some(Action::ShowHelp) => {
                self.show_help()?;
                Ok(false)
            }
            Some(Action::FocusNext) => {
                self.rotate_focus();
                Ok(false)
            }
            None => {
                if let Some(window) = self.focused_mut() {
                    window.handle_key(key);
                }
                Ok(false)
            }
        }
    }

    fn quit(&mut self) -> Result<bool> {
        let Some(window) = self.focused() else {
            return Ok(true);
        };
        match window.handle_quit() {
            Action::Quit => Ok(true),
            _ if self.is_help_shown() => {
                self.close_help()?;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Draw every window, or only the help overlay while it is shown, as one
    /// screen update.
    pub fn refresh_all(&mut self) -> Result<()> {
        let mut stack = PanelStack::new();

        if let Some(help) = &mut self.help {
            stack.push(help.populate(true)?);
            return self.screen.composite(stack);
        }

        for (idx, window) in self.windows.iter_mut().enumerate().rev() {
            stack.push(window.populate(idx == 0)?);
        }
        self.screen.composite(stack)
    }

    /// Rebuild the rows of every dynamic table from `source`.
    pub fn regenerate(&mut self, source: &dyn DataSource) -> Result<()> {
        let max_width = self.bounds().width;
        for window in &mut self.windows {
            let Some(table) = window.table_mut() else {
                continue;
            };
            if table.is_dynamic() {
                table.regenerate(source, max_width)?;
            }
        }
        Ok(())
    }

    fn tick(&mut self, source: Option<&dyn DataSource>, logs: Option<&Receiver<String>>) -> Result<()> {
        if let Some(source) = source {
            self.regenerate(source)?;
        }
        if let Some(latest) = logs.and_then(|rx| rx.try_iter().last()) {
            self.screen.status_mut().set_message(latest);
        }
        self.refresh_all()
    }

    /// Refresh, then keep dispatching input and refreshing until quit. With
    /// no input for `interval`, refresh anyway so live tables stay current.
    pub async fn run(
        &mut self,
        mut inputs: Inputs,
        interval: Duration,
        source: Option<&dyn DataSource>,
        logs: Option<Receiver<String>>,
    ) -> Result<()> {
        tracing::info!(windows = self.windows.len(), ?interval, "window manager running");
        self.tick(source, logs.as_ref())?;

        loop {
            tokio::select! {
                Some(key) = inputs.keys.recv() => {
                    if self.handle_key(key)? {
                        tracing::info!("quit requested");
                        return Ok(());
                    }
                }
                Some(mouse) = inputs.mice.recv() => {
                    if let Some(input) = MouseInput::from_crossterm(&mouse) {
                        self.handle_mouse(input)?;
                    }
                }
                _ = tokio::time::sleep(interval) => {}
            }
            self.tick(source, logs.as_ref())?;
        }
    }
}
