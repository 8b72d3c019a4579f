//! UI events and keyboard shortcuts that drive the undo history.

use crate::command::Command;

pub const UNDO_REQUEST: &str = "undoRequest";
pub const REDO_REQUEST: &str = "redoRequest";

/// A named event emitted by the remote UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    UndoRequest,
    RedoRequest,
}

impl UiEvent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            UNDO_REQUEST => Some(UiEvent::UndoRequest),
            REDO_REQUEST => Some(UiEvent::RedoRequest),
            _ => None,
        }
    }

    pub const fn command(self) -> Command {
        match self {
            UiEvent::UndoRequest => Command::Undo,
            UiEvent::RedoRequest => Command::Redo,
        }
    }
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Ctrl, or Cmd on macOS.
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key press forwarded from the editor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: char,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub const fn new(key: char) -> Self {
        Self {
            key,
            modifiers: Modifiers {
                command: false,
                shift: false,
                alt: false,
            },
        }
    }

    /// `key` with the command modifier held.
    pub const fn command(key: char) -> Self {
        let mut press = Self::new(key);
        press.modifiers.command = true;
        press
    }

    pub const fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    /// History command bound to this key: Ctrl+Z undoes, Ctrl+Y and
    /// Ctrl+Shift+Z redo.
    pub fn history_command(&self) -> Option<Command> {
        let Modifiers {
            command,
            shift,
            alt,
        } = self.modifiers;
        if !command || alt {
            return None;
        }
        match self.key.to_ascii_lowercase() {
            'z' if shift => Some(Command::Redo),
            'z' => Some(Command::Undo),
            'y' => Some(Command::Redo),
            _ => None,
        }
    }
}
