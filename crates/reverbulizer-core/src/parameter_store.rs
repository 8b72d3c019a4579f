//! Canonical, thread-visible parameter values.
//!
//! The [`ParameterStore`] owns every parameter value. It is shared (through
//! [`SharedState`](crate::SharedState)) between the audio thread, the editor
//! and the bridge.
//!
//! # Thread Safety
//!
//! Parameters are accessed from multiple threads:
//! - Audio thread: reads all values once per block via [`ParameterStore::snapshot()`]
//! - UI thread: writes through [`ParameterStore::set()`] and drives undo/redo
//! - Bridge thread: executes remote commands
//!
//! Values live in `AtomicU64` slots (`f64::to_bits`/`from_bits`), so reads
//! never block. Range checking happens on the write path, so the audio thread
//! never sees an out-of-range value. The undo history sits behind a mutex the
//! audio thread never touches.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::ParameterError;
use crate::parameter::{ParameterId, ParameterInfo};
use crate::types::ParameterValue;
use crate::undo::{Action, HistoryOutcome, Originator, UndoHistory};

/// All parameter values captured at one point in time.
///
/// Read once per block on the audio thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub gain: f32,
    pub bypass: bool,
    pub mono_sum: bool,
    pub room_size: f32,
    pub mix: f32,
    pub width: f32,
    pub damping: f32,
    pub freeze: f32,
}

/// Lock-free parameter storage with an undoable write path.
pub struct ParameterStore {
    values: [AtomicU64; ParameterId::COUNT],
    version: AtomicU64,
    history: Mutex<UndoHistory>,
}

impl ParameterStore {
    /// Create a store holding every parameter's default, keeping at most
    /// `undo_limit` undoable actions.
    pub fn new(undo_limit: usize) -> Self {
        Self {
            values: ParameterId::ALL.map(|id| AtomicU64::new(id.info().default.to_bits())),
            version: AtomicU64::new(0),
            history: Mutex::new(UndoHistory::new(undo_limit)),
        }
    }

    /// Static metadata for a parameter.
    #[inline]
    pub fn info(&self, id: ParameterId) -> ParameterInfo {
        id.info()
    }

    /// Current value of a parameter.
    ///
    /// Lock-free and safe to call from the audio thread.
    #[inline]
    pub fn get(&self, id: ParameterId) -> ParameterValue {
        f64::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Current value of a toggle.
    #[inline]
    pub fn get_bool(&self, id: ParameterId) -> bool {
        self.get(id) >= 0.5
    }

    /// Counter bumped on every stored change (writes, undo, redo, reset).
    ///
    /// The audio thread compares it against the last value it saw to find
    /// out whether anything changed since the previous block.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Read every parameter at once.
    ///
    /// Lock-free and allocation-free; called at the start of each block.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            gain: self.get(ParameterId::Gain) as f32,
            bypass: self.get_bool(ParameterId::Bypass),
            mono_sum: self.get_bool(ParameterId::MonoSum),
            room_size: self.get(ParameterId::RoomSize) as f32,
            mix: self.get(ParameterId::Mix) as f32,
            width: self.get(ParameterId::Width) as f32,
            damping: self.get(ParameterId::Damping) as f32,
            freeze: self.get(ParameterId::Freeze) as f32,
        }
    }

    /// Write a parameter and record the change as one undoable action bound
    /// to `originator`.
    ///
    /// Returns the previous value. Fails with [`ParameterError::OutOfRange`]
    /// (leaving the stored value untouched) if `value` is not finite or lies
    /// outside the declared range. Writing the value that is already stored
    /// succeeds without recording anything.
    pub fn set(
        &self,
        id: ParameterId,
        value: ParameterValue,
        originator: Originator,
    ) -> Result<ParameterValue, ParameterError> {
        let info = id.info();
        if !info.contains(value) {
            return Err(ParameterError::OutOfRange {
                id,
                value,
                min: info.min,
                max: info.max,
            });
        }
        let value = info.quantize(value);

        // Holding the history lock across the swap keeps the recorded
        // `previous` consistent with concurrent writers.
        let mut history = self.history.lock();
        let previous = self.store(id, value);
        if previous != value {
            history.record(Action {
                id,
                previous,
                value,
                originator,
            });
        }
        Ok(previous)
    }

    /// Write a toggle.
    pub fn set_bool(
        &self,
        id: ParameterId,
        value: bool,
        originator: Originator,
    ) -> Result<bool, ParameterError> {
        let previous = self.set(id, if value { 1.0 } else { 0.0 }, originator)?;
        Ok(previous >= 0.5)
    }

    /// Resolve a string identifier and write it.
    pub fn set_by_identifier(
        &self,
        identifier: &str,
        value: ParameterValue,
        originator: Originator,
    ) -> Result<ParameterValue, ParameterError> {
        let id = ParameterId::from_identifier(identifier)
            .ok_or_else(|| ParameterError::UnknownIdentifier(identifier.to_string()))?;
        self.set(id, value, originator)
    }

    /// Revert the most recent recorded action.
    pub fn undo(&self) -> HistoryOutcome {
        let mut history = self.history.lock();
        match history.take_undo() {
            Some(action) => {
                self.store(action.id, action.previous);
                HistoryOutcome::Undone(action)
            }
            None => HistoryOutcome::NothingToUndo,
        }
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&self) -> HistoryOutcome {
        let mut history = self.history.lock();
        match history.take_redo() {
            Some(action) => {
                self.store(action.id, action.value);
                HistoryOutcome::Redone(action)
            }
            None => HistoryOutcome::NothingToRedo,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().can_redo()
    }

    /// Forget all recorded actions (e.g., after loading a preset).
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// Put every parameter back to its default. Each parameter that actually
    /// changes is recorded as its own action.
    pub fn reset_to_defaults(&self, originator: Originator) {
        for id in ParameterId::ALL {
            // Defaults are always in range.
            let _ = self.set(id, id.info().default, originator);
        }
    }

    /// Store without recording. Returns the previous value.
    fn store(&self, id: ParameterId, value: ParameterValue) -> ParameterValue {
        let previous = self.values[id.index()].swap(value.to_bits(), Ordering::Relaxed);
        self.version.fetch_add(1, Ordering::Release);
        f64::from_bits(previous)
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_UNDO_LIMIT)
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("values", &self.snapshot())
            .field("version", &self.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let store = ParameterStore::default();
        for id in ParameterId::ALL {
            assert_eq!(store.get(id), id.info().default);
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.gain, 1.0);
        assert!(!snapshot.bypass);
        assert_eq!(snapshot.mix, 0.75);
    }

    #[test]
    fn test_set_then_get() {
        let store = ParameterStore::default();
        for (i, id) in ParameterId::ALL.into_iter().enumerate() {
            let value = if id.info().kind == crate::ParameterKind::Toggle {
                1.0
            } else {
                0.1 * i as f64
            };
            store.set(id, value, Originator::Editor).unwrap();
            assert_eq!(store.get(id), value);
        }
    }

    #[test]
    fn test_out_of_range_keeps_previous() {
        let store = ParameterStore::default();
        store.set(ParameterId::RoomSize, 0.3, Originator::Editor).unwrap();

        let err = store
            .set(ParameterId::RoomSize, 1.5, Originator::Editor)
            .unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { id: ParameterId::RoomSize, .. }));
        assert!(store.set(ParameterId::RoomSize, f64::NAN, Originator::Host).is_err());
        assert!(store.set(ParameterId::RoomSize, -0.01, Originator::Host).is_err());

        assert_eq!(store.get(ParameterId::RoomSize), 0.3);
        // Only the successful write is undoable.
        assert!(store.undo().is_applied());
        assert_eq!(store.undo(), HistoryOutcome::NothingToUndo);
    }

    #[test]
    fn test_undo_redo_restores_value() {
        let store = ParameterStore::default();
        store.set(ParameterId::Mix, 0.2, Originator::Editor).unwrap();
        store.set(ParameterId::Mix, 0.9, Originator::Remote).unwrap();

        let before_undo = store.get(ParameterId::Mix);
        let outcome = store.undo();
        assert!(matches!(outcome, HistoryOutcome::Undone(a) if a.originator == Originator::Remote));
        assert_eq!(store.get(ParameterId::Mix), 0.2);

        store.redo();
        assert_eq!(store.get(ParameterId::Mix), before_undo);
    }

    #[test]
    fn test_exhausted_history() {
        let store = ParameterStore::default();
        assert_eq!(store.undo(), HistoryOutcome::NothingToUndo);
        assert_eq!(store.redo(), HistoryOutcome::NothingToRedo);

        store.set(ParameterId::Width, 0.1, Originator::Editor).unwrap();
        store.undo();
        assert_eq!(store.undo(), HistoryOutcome::NothingToUndo);
        assert_eq!(store.get(ParameterId::Width), 0.75);
    }

    #[test]
    fn test_same_value_not_recorded() {
        let store = ParameterStore::default();
        store.set(ParameterId::Gain, 1.0, Originator::Editor).unwrap();
        assert!(!store.can_undo());
    }

    #[test]
    fn test_toggle_quantized() {
        let store = ParameterStore::default();
        store.set(ParameterId::Bypass, 0.7, Originator::Host).unwrap();
        assert_eq!(store.get(ParameterId::Bypass), 1.0);
        assert!(store.get_bool(ParameterId::Bypass));

        assert!(store.set_bool(ParameterId::Bypass, false, Originator::Host).unwrap());
        assert!(!store.snapshot().bypass);
    }

    #[test]
    fn test_version_tracks_changes() {
        let store = ParameterStore::default();
        let v0 = store.version();
        store.set(ParameterId::Damping, 0.1, Originator::Editor).unwrap();
        let v1 = store.version();
        assert!(v1 > v0);
        store.undo();
        assert!(store.version() > v1);
    }

    #[test]
    fn test_set_by_identifier() {
        let store = ParameterStore::default();
        store.set_by_identifier("DAMP", 0.25, Originator::Remote).unwrap();
        assert_eq!(store.get(ParameterId::Damping), 0.25);
        assert!(matches!(
            store.set_by_identifier("ROOM", 0.25, Originator::Remote),
            Err(ParameterError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn test_reset_to_defaults_is_undoable() {
        let store = ParameterStore::default();
        store.set(ParameterId::RoomSize, 0.9, Originator::Editor).unwrap();
        store.set(ParameterId::Freeze, 1.0, Originator::Editor).unwrap();
        store.clear_history();

        store.reset_to_defaults(Originator::Editor);
        assert_eq!(store.get(ParameterId::RoomSize), 0.5);
        assert_eq!(store.get(ParameterId::Freeze), 0.0);

        store.undo();
        store.undo();
        assert_eq!(store.get(ParameterId::RoomSize), 0.9);
        assert_eq!(store.get(ParameterId::Freeze), 1.0);
    }
}
