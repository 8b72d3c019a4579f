//! Single-writer spectrum snapshot slot.
//!
//! The analyzer (audio thread) is the only writer; any number of consumers
//! read. Both sides use try-acquire only: a writer that finds the slot held
//! drops its frame, and a reader that finds it held reports
//! [`UnavailableReason::Contended`] and polls again later. Nobody waits.
//!
//! Publishing swaps a fully built buffer into the slot, so a reader sees
//! either the previous frame or the new one, never a mix of both.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{SnapshotUnavailable, UnavailableReason};

#[derive(Debug)]
pub(crate) struct Frame {
    levels: Vec<f32>,
    generation: u64,
}

/// Holds the latest published spectrum.
#[derive(Debug)]
pub struct SpectrumSlot {
    bins: usize,
    frame: RwLock<Frame>,
    published: AtomicU64,
}

impl SpectrumSlot {
    /// Create an empty slot for frames of exactly `bins` levels.
    pub fn new(bins: usize) -> Self {
        Self {
            bins,
            frame: RwLock::new(Frame {
                levels: Vec::with_capacity(bins),
                generation: 0,
            }),
            published: AtomicU64::new(0),
        }
    }

    /// Declared bin count.
    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Generation of the latest published frame (0 = nothing published yet).
    #[inline]
    pub fn generation(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// Try to publish `levels` without blocking.
    ///
    /// On success the slot's previous buffer is swapped into `levels`, so the
    /// caller can reuse it for the next frame without allocating. Returns
    /// false (and leaves `levels` untouched) if the slot is held by a reader.
    pub fn try_publish(&self, levels: &mut Vec<f32>) -> bool {
        let Some(mut frame) = self.frame.try_write() else {
            return false;
        };
        std::mem::swap(&mut frame.levels, levels);
        frame.generation += 1;
        self.published.store(frame.generation, Ordering::Release);
        true
    }

    /// Try to copy the latest frame into `out`, reusing its allocation.
    ///
    /// Returns the frame's generation.
    pub fn try_read_into(&self, out: &mut Vec<f32>) -> Result<u64, SnapshotUnavailable> {
        let frame = self
            .frame
            .try_read()
            .ok_or(SnapshotUnavailable::new(UnavailableReason::Contended))?;
        self.validate(&frame)?;
        out.clear();
        out.extend_from_slice(&frame.levels);
        Ok(frame.generation)
    }

    /// Try to read a copy of the latest frame.
    pub fn try_snapshot(&self) -> Result<Vec<f32>, SnapshotUnavailable> {
        let mut levels = Vec::with_capacity(self.bins);
        self.try_read_into(&mut levels)?;
        Ok(levels)
    }

    #[cfg(test)]
    pub(crate) fn read_guard(&self) -> parking_lot::RwLockReadGuard<'_, Frame> {
        self.frame.read()
    }

    fn validate(&self, frame: &Frame) -> Result<(), SnapshotUnavailable> {
        if frame.generation == 0 {
            return Err(SnapshotUnavailable::new(UnavailableReason::NotPublished));
        }
        if frame.levels.len() != self.bins {
            return Err(SnapshotUnavailable::new(UnavailableReason::LengthMismatch {
                expected: self.bins,
                found: frame.levels.len(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_not_published() {
        let slot = SpectrumSlot::new(4);
        assert_eq!(slot.generation(), 0);
        assert_eq!(
            slot.try_snapshot().unwrap_err().reason,
            UnavailableReason::NotPublished
        );
    }

    #[test]
    fn test_publish_swaps_buffers() {
        let slot = SpectrumSlot::new(3);
        let mut frame = vec![0.1, 0.2, 0.3];
        assert!(slot.try_publish(&mut frame));
        assert!(frame.is_empty());
        assert_eq!(slot.try_snapshot().unwrap(), vec![0.1, 0.2, 0.3]);

        frame.extend_from_slice(&[0.4, 0.5, 0.6]);
        assert!(slot.try_publish(&mut frame));
        assert_eq!(frame, vec![0.1, 0.2, 0.3]);
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn test_publish_dropped_while_read() {
        let slot = SpectrumSlot::new(2);
        let mut frame = vec![0.0, 1.0];
        slot.try_publish(&mut frame);

        let guard = slot.frame.read();
        let mut next = vec![0.5, 0.5];
        assert!(!slot.try_publish(&mut next));
        assert_eq!(next, vec![0.5, 0.5]);
        drop(guard);

        assert_eq!(slot.try_snapshot().unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_read_contended_while_publishing() {
        let slot = SpectrumSlot::new(2);
        let guard = slot.frame.write();
        assert_eq!(
            slot.try_snapshot().unwrap_err().reason,
            UnavailableReason::Contended
        );
        drop(guard);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let slot = SpectrumSlot::new(4);
        let mut frame = vec![0.0; 3];
        slot.try_publish(&mut frame);
        assert_eq!(
            slot.try_snapshot().unwrap_err().reason,
            UnavailableReason::LengthMismatch {
                expected: 4,
                found: 3
            }
        );
    }
}
