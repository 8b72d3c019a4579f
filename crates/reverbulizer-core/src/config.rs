//! Plugin configuration.
//!
//! Identity metadata plus the DSP and history constants the processor is
//! built with. Everything is `const`, so a configuration can live in a
//! `static`.
//!
//! # Example
//!
//! ```ignore
//! use reverbulizer_core::PluginConfig;
//!
//! pub static CONFIG: PluginConfig = PluginConfig::new("Reverbulizer")
//!     .with_vendor("Helpermedia")
//!     .with_gain_ramp_ms(2.0)
//!     .with_fft_order(10);
//! ```

use std::ops::RangeInclusive;

use crate::error::{PluginError, PluginResult};

/// Undo history depth used by [`PluginConfig::DEFAULT`].
pub const DEFAULT_UNDO_LIMIT: usize = 256;

/// Accepted spectrum FFT orders (16 to 65536 samples).
pub const FFT_ORDER_RANGE: RangeInclusive<u32> = 4..=16;

/// Plugin metadata and processing constants.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Plugin name displayed by the host.
    pub name: &'static str,

    /// Vendor/company name.
    pub vendor: &'static str,

    /// Plugin version string.
    pub version: &'static str,

    /// Ramp time of the smoothed output gain, in milliseconds.
    pub gain_ramp_ms: f32,

    /// Level meter attack time, in milliseconds.
    pub envelope_attack_ms: f32,

    /// Level meter release time, in milliseconds.
    pub envelope_release_ms: f32,

    /// Spectrum FFT size as a power of two (11 = 2048 samples).
    pub fft_order: u32,

    /// Log-frequency skew of the spectrum bins.
    pub spectrum_skew: f32,

    /// Freeze parameter value at and above which the reverb tail is held.
    pub freeze_threshold: f32,

    /// Maximum number of undoable parameter changes.
    pub undo_limit: usize,
}

impl PluginConfig {
    /// The stock configuration.
    pub const DEFAULT: PluginConfig = PluginConfig::new("Reverbulizer");

    /// Create a configuration with default processing constants.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            vendor: "Helpermedia",
            version: env!("CARGO_PKG_VERSION"),
            gain_ramp_ms: 1.0,
            envelope_attack_ms: 200.0,
            envelope_release_ms: 200.0,
            fft_order: 11,
            spectrum_skew: 0.2,
            freeze_threshold: 0.5,
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }

    /// Set the vendor name.
    pub const fn with_vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = vendor;
        self
    }

    /// Set the version string.
    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    pub const fn with_gain_ramp_ms(mut self, ms: f32) -> Self {
        self.gain_ramp_ms = ms;
        self
    }

    /// Set the level meter attack and release times.
    pub const fn with_envelope_ms(mut self, attack_ms: f32, release_ms: f32) -> Self {
        self.envelope_attack_ms = attack_ms;
        self.envelope_release_ms = release_ms;
        self
    }

    /// Set the spectrum FFT order. Bin count is `2^order / 4`.
    pub const fn with_fft_order(mut self, order: u32) -> Self {
        self.fft_order = order;
        self
    }

    pub const fn with_spectrum_skew(mut self, skew: f32) -> Self {
        self.spectrum_skew = skew;
        self
    }

    /// Set where the freeze parameter engages.
    pub const fn with_freeze_threshold(mut self, threshold: f32) -> Self {
        self.freeze_threshold = threshold;
        self
    }

    pub const fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit;
        self
    }

    /// Reject processing constants the DSP cannot be built with.
    pub fn validate(&self) -> PluginResult<()> {
        if !FFT_ORDER_RANGE.contains(&self.fft_order) {
            return Err(PluginError::InvalidFftOrder(self.fft_order));
        }
        Ok(())
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
