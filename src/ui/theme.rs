use ratatui::style::{Color, Modifier, Style};

/// Color palette and style constants for the TUI.
pub struct Theme;

impl Theme {
    // Window frames
    pub fn border_focused() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn border_unfocused() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    // Tables
    pub fn table_header() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn table_row() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn sort_marker() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    }

    pub fn status_clock() -> Style {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    }

    pub fn status_key_hint() -> Style {
        Style::default().fg(Color::DarkGray).bg(Color::Cyan)
    }

    // Help
    pub fn help_title() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn help_section() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn help_key() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn help_description() -> Style {
        Style::default().fg(Color::White)
    }
}
