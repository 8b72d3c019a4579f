//! Common types used throughout Reverbulizer.

use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// Audio Buffer Limits
// =============================================================================

/// Maximum number of audio channels a [`Buffer`](crate::Buffer) can carry.
///
/// The effect itself only accepts mono or stereo layouts, but hosts may hand
/// over buffers with extra (unused) output channels which still have to be
/// cleared, so the buffer keeps some headroom.
pub const MAX_CHANNELS: usize = 8;

/// Parameter value in plain units (all Reverbulizer parameters live in 0.0..=1.0).
pub type ParameterValue = f64;

/// Floor used whenever a gain is converted to decibels.
pub const MINUS_INFINITY_DB: f32 = -100.0;

/// Convert a linear gain to decibels, flooring at [`MINUS_INFINITY_DB`].
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(MINUS_INFINITY_DB)
    } else {
        MINUS_INFINITY_DB
    }
}

// =============================================================================
// AtomicF32
// =============================================================================

/// An `f32` stored as its bit pattern in an [`AtomicU32`].
///
/// Used for single-word telemetry values which are replaced wholesale by the
/// audio thread and read from any other thread without locking.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Create a new atomic holding `value`.
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Load the current value.
    #[inline]
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    /// Replace the current value.
    #[inline]
    pub fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}
