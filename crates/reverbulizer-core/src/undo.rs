//! Undo/redo history for parameter writes.
//!
//! Every successful [`ParameterStore::set()`](crate::ParameterStore::set) is
//! recorded as one [`Action`]. The history itself is plain data; the store
//! keeps it behind a mutex that only control threads ever take.

use std::collections::VecDeque;
use std::fmt;

use crate::parameter::ParameterId;
use crate::types::ParameterValue;

/// Who issued a parameter write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Originator {
    /// Host automation or a host-provided generic UI.
    Host,
    /// The plugin's own editor.
    Editor,
    /// A remote consumer talking through the bridge.
    Remote,
}

/// One recorded parameter change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub id: ParameterId,
    /// Value before the write.
    pub previous: ParameterValue,
    /// Value after the write.
    pub value: ParameterValue,
    pub originator: Originator,
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryOutcome {
    /// The action was reverted; the parameter now holds `action.previous`.
    Undone(Action),
    /// The action was re-applied; the parameter now holds `action.value`.
    Redone(Action),
    NothingToUndo,
    NothingToRedo,
}

impl HistoryOutcome {
    /// Returns true if a value was actually changed.
    pub fn is_applied(&self) -> bool {
        matches!(self, HistoryOutcome::Undone(_) | HistoryOutcome::Redone(_))
    }
}

impl fmt::Display for HistoryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryOutcome::Undone(action) => write!(
                f,
                "undo: {} {:.2} -> {:.2}",
                action.id.identifier(),
                action.value,
                action.previous
            ),
            HistoryOutcome::Redone(action) => write!(
                f,
                "redo: {} {:.2} -> {:.2}",
                action.id.identifier(),
                action.previous,
                action.value
            ),
            HistoryOutcome::NothingToUndo => f.write_str("nothing to undo"),
            HistoryOutcome::NothingToRedo => f.write_str("nothing to redo"),
        }
    }
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo: VecDeque<Action>,
    redo: Vec<Action>,
    limit: usize,
}

impl UndoHistory {
    /// Create an empty history that keeps at most `limit` undoable actions.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(limit.min(1024)),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record a fresh action. Clears the redo stack.
    pub fn record(&mut self, action: Action) {
        if self.limit == 0 {
            return;
        }
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(action);
        self.redo.clear();
    }

    /// Pop the most recent action for undoing. The caller applies
    /// `action.previous`.
    pub fn take_undo(&mut self) -> Option<Action> {
        let action = self.undo.pop_back()?;
        self.redo.push(action);
        Some(action)
    }

    /// Pop the most recently undone action for redoing. The caller applies
    /// `action.value`.
    pub fn take_redo(&mut self) -> Option<Action> {
        let action = self.redo.pop()?;
        self.undo.push_back(action);
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable actions.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(value: f64) -> Action {
        Action {
            id: ParameterId::Mix,
            previous: value - 0.1,
            value,
            originator: Originator::Editor,
        }
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = UndoHistory::new(8);
        history.record(action(0.5));
        history.record(action(0.6));

        assert_eq!(history.take_undo(), Some(action(0.6)));
        assert!(history.can_redo());
        assert_eq!(history.take_redo(), Some(action(0.6)));
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = UndoHistory::new(8);
        history.record(action(0.5));
        history.take_undo();
        assert!(history.can_redo());

        history.record(action(0.7));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = UndoHistory::new(2);
        history.record(action(0.3));
        history.record(action(0.4));
        history.record(action(0.5));

        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.take_undo(), Some(action(0.5)));
        assert_eq!(history.take_undo(), Some(action(0.4)));
        assert_eq!(history.take_undo(), None);
    }

    #[test]
    fn test_zero_limit_records_nothing() {
        let mut history = UndoHistory::new(0);
        history.record(action(0.5));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_outcome_display() {
        let a = Action {
            id: ParameterId::RoomSize,
            previous: 0.5,
            value: 0.7,
            originator: Originator::Remote,
        };
        assert_eq!(HistoryOutcome::Undone(a).to_string(), "undo: SIZE 0.70 -> 0.50");
        assert_eq!(HistoryOutcome::Redone(a).to_string(), "redo: SIZE 0.50 -> 0.70");
        assert_eq!(HistoryOutcome::NothingToUndo.to_string(), "nothing to undo");
        assert!(!HistoryOutcome::NothingToRedo.is_applied());
    }
}
