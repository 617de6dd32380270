use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::ui::theme::Theme;

const MESSAGE_PREFIX: &str = ">> ";
const KEY_HINTS: &str = " q:quit h:help ";

/// One-line bar at the bottom of the screen: the latest diagnostic on the
/// left, time of the last refresh and key hints on the right.
pub struct StatusBar {
    message: Option<String>,
    refreshed_at: Option<DateTime<Local>>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            message: None,
            refreshed_at: None,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn set_refreshed_at(&mut self, at: DateTime<Local>) {
        self.refreshed_at = Some(at);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            format!("{MESSAGE_PREFIX}{}", self.message.as_deref().unwrap_or("")),
            Theme::status_bar(),
        )];

        let clock = self
            .refreshed_at
            .map(|t| format!(" {} ", t.format("%H:%M:%S")))
            .unwrap_or_default();
        let right_width = clock.len() + KEY_HINTS.len();

        let used_width: usize = spans.iter().map(|s| s.width()).sum();
        let remaining = area.width as usize - used_width.min(area.width as usize);
        if remaining > right_width {
            let padding = " ".repeat(remaining - right_width);
            spans.push(Span::styled(padding, Theme::status_bar()));
            spans.push(Span::styled(clock, Theme::status_clock()));
            spans.push(Span::styled(KEY_HINTS, Theme::status_key_hint()));
        }

        let bar = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
        frame.render_widget(bar, area);
    }
}
