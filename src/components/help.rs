use std::sync::Arc;

use ratatui::layout::{Position, Size};

use crate::ui::surface::{fit_width, Surface};
use crate::ui::theme::Theme;

use super::window::Window;

const MOUSE_KEY_WIDTH: usize = 35;
const KEYBOARD_KEY_WIDTH: usize = 10;

fn banner() -> Vec<String> {
    vec![
        format!("stormdash {}", env!("CARGO_PKG_VERSION")),
        env!("CARGO_PKG_DESCRIPTION").to_string(),
    ]
}

fn mouse_bindings() -> Vec<(&'static str, &'static str)> {
    vec![
        ("left click on a window", "select the window"),
        ("left click on a column header", "sort the table by that column"),
        ("left click and drag", "move the window (release to place)"),
    ]
}

fn keyboard_bindings() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Tab", "focus on next window"),
        ("h / ?", "this help"),
        ("q", "quit, or close this help"),
        ("arrows", "scroll this help"),
    ]
}

/// Write the help text onto `canvas`, then shrink the canvas to exactly what
/// was written.
pub fn draw_help(canvas: &mut Surface) {
    let mut y: u16 = 0;
    let mut width: usize = 0;

    for line in banner() {
        canvas.print(y, 0, &line, Theme::help_title());
        width = width.max(line.chars().count());
        y += 1;
    }

    let sections = [
        ("Mouse:", mouse_bindings(), MOUSE_KEY_WIDTH),
        ("Keyboard:", keyboard_bindings(), KEYBOARD_KEY_WIDTH),
    ];
    for (title, bindings, split) in sections {
        y += 1;
        canvas.print(y, 1, title, Theme::help_section());
        y += 1;

        for (key, action) in bindings {
            let key = fit_width(&format!("{key}: "), split);
            canvas.print(y, 1, &key, Theme::help_key());
            canvas.print(y, 1 + split as u16, action, Theme::help_description());
            width = width.max(1 + split + action.chars().count());
            y += 1;
        }
    }

    let width = u16::try_from(width).unwrap_or(u16::MAX);
    canvas.resize(y, width);
}

/// The help overlay: a pad over the whole usable screen that `q` dismisses.
pub fn help_window(bounds: Size) -> Window {
    Window::pad(
        "help",
        Arc::new(draw_help),
        Size::new(0, 0),
        Size::new(0, 0),
        Position::ORIGIN,
        bounds,
    )
    .dismissible()
}
