use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Position;
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// At most one pending key and one pending mouse event.
const EVENT_SLOTS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Dismiss,
    ShowHelp,
    FocusNext,
}

/// Keys with a meaning of their own. Everything else goes to the focused
/// window.
pub fn key_action(key: &KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('h') | KeyCode::Char('?') => Some(Action::ShowHelp),
        KeyCode::Tab => Some(Action::FocusNext),
        _ => None,
    }
}

/// Left-button activity, with the screen position it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseInput {
    /// Press and release reported together by the terminal.
    Click(Position),
    Press(Position),
    Drag(Position),
    Release(Position),
}

impl MouseInput {
    pub fn from_crossterm(ev: &MouseEvent) -> Option<Self> {
        let pos = Position::new(ev.column, ev.row);
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(MouseInput::Press(pos)),
            MouseEventKind::Drag(MouseButton::Left) => Some(MouseInput::Drag(pos)),
            MouseEventKind::Up(MouseButton::Left) => Some(MouseInput::Release(pos)),
            _ => None,
        }
    }
}

/// Receiving ends of the input reader.
pub struct Inputs {
    pub keys: mpsc::Receiver<KeyEvent>,
    pub mice: mpsc::Receiver<MouseEvent>,
}

/// Read terminal input on a blocking thread and hand it over through two
/// single-slot channels. The reader waits while a slot is occupied and stops
/// once the receivers are gone.
pub fn spawn_event_reader() -> Inputs {
    let (key_tx, keys) = mpsc::channel(EVENT_SLOTS);
    let (mouse_tx, mice) = mpsc::channel(EVENT_SLOTS);

    tokio::task::spawn_blocking(move || loop {
        if key_tx.is_closed() || mouse_tx.is_closed() {
            break;
        }
        if !event::poll(POLL_INTERVAL).unwrap_or(false) {
            continue;
        }
        let delivered = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                key_tx.blocking_send(key).is_ok()
            }
            Ok(Event::Mouse(mouse)) => mouse_tx.blocking_send(mouse).is_ok(),
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(%err, "failed to read terminal event");
                true
            }
        };
        if !delivered {
            break;
        }
    });

    Inputs { keys, mice }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn reserved_keys_map_to_actions() {
        let action = |code| key_action(&KeyEvent::new(code, KeyModifiers::NONE));
        assert_eq!(action(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(action(KeyCode::Char('h')), Some(Action::ShowHelp));
        assert_eq!(action(KeyCode::Char('?')), Some(Action::ShowHelp));
        assert_eq!(action(KeyCode::Tab), Some(Action::FocusNext));
        assert_eq!(action(KeyCode::Down), None);
        assert_eq!(action(KeyCode::Char('x')), None);
    }

    #[test]
    fn left_button_maps_to_gesture_steps() {
        assert_eq!(
            MouseInput::from_crossterm(&mouse(MouseEventKind::Down(MouseButton::Left), 3, 7)),
            Some(MouseInput::Press(Position::new(3, 7)))
        );
        assert_eq!(
            MouseInput::from_crossterm(&mouse(MouseEventKind::Drag(MouseButton::Left), 4, 7)),
            Some(MouseInput::Drag(Position::new(4, 7)))
        );
        assert_eq!(
            MouseInput::from_crossterm(&mouse(MouseEventKind::Up(MouseButton::Left), 4, 8)),
            Some(MouseInput::Release(Position::new(4, 8)))
        );
    }

    #[test]
    fn other_mouse_activity_is_ignored() {
        for kind in [
            MouseEventKind::Moved,
            MouseEventKind::Down(MouseButton::Right),
            MouseEventKind::ScrollDown,
        ] {
            assert_eq!(MouseInput::from_crossterm(&mouse(kind, 1, 1)), None);
        }
    }
}
