use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::SessionEvent;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Session(SessionEvent),
    Quit,
}

/// Caret and buffer facts the key map needs to turn arrows into positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub cursor: usize,
    pub typed_len: usize,
    pub finished: bool,
}

pub fn action_for_key(key: KeyEvent, ctx: InputContext) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return Some(Action::Quit),
        KeyCode::Char('r') if ctrl => return Some(Action::Session(SessionEvent::RequestReset)),
        KeyCode::Esc => return Some(Action::Quit),
        KeyCode::Tab => return Some(Action::Session(SessionEvent::RequestReset)),
        _ => {}
    }

    if ctx.finished {
        // input is disabled once the round is scored
        return match key.code {
            KeyCode::Char('r') | KeyCode::Char('n') | KeyCode::Enter => {
                Some(Action::Session(SessionEvent::RequestReset))
            }
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
    }

    let event = match key.code {
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => return None,
        KeyCode::Char(c) => SessionEvent::TypeCharacter(c),
        KeyCode::Backspace => SessionEvent::DeleteCharacter,
        KeyCode::Left => SessionEvent::MoveCursor(ctx.cursor.saturating_sub(1)),
        KeyCode::Right => SessionEvent::MoveCursor((ctx.cursor + 1).min(ctx.typed_len)),
        KeyCode::Up | KeyCode::Home => SessionEvent::MoveCursor(0),
        KeyCode::Down | KeyCode::End => SessionEvent::MoveCursor(ctx.typed_len),
        _ => return None,
    };
    Some(Action::Session(event))
}
