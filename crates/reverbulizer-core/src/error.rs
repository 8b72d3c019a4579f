//! Error types for Reverbulizer.
//!
//! Nothing in here is ever constructed on the audio thread except
//! [`SnapshotUnavailable`], which is a plain value and never allocates.

use thiserror::Error;

use crate::parameter::ParameterId;

/// Errors raised while bringing the plugin up.
///
/// These are fatal to instantiation but never to audio processing: once
/// [`Plugin::prepare()`](crate::Plugin::prepare) succeeded, the processor
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginError {
    /// The host asked for a channel layout other than mono→mono or stereo→stereo.
    #[error("unsupported bus layout: {inputs} input / {outputs} output channels")]
    UnsupportedLayout { inputs: u32, outputs: u32 },

    /// The host reported a sample rate that cannot drive the DSP.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// The host reported a zero maximum block size.
    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    /// The configured FFT order lies outside [`FFT_ORDER_RANGE`](crate::FFT_ORDER_RANGE).
    #[error("unsupported FFT order: {0}")]
    InvalidFftOrder(u32),

    /// The shared spectrum slot was sized for a different FFT order than the
    /// one the plugin is configured with.
    #[error("spectrum slot holds {found} bins, configuration needs {expected}")]
    SpectrumSizeMismatch { expected: usize, found: usize },
}

/// Result type for plugin lifecycle operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors raised by the [`ParameterStore`](crate::ParameterStore) write path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// The value lies outside the declared range (or is not finite).
    /// The stored value is left untouched.
    #[error("{value} is out of range for {} ({min}..={max})", id.identifier())]
    OutOfRange {
        id: ParameterId,
        value: f64,
        min: f64,
        max: f64,
    },

    /// No parameter is declared under this identifier.
    #[error("unknown parameter identifier: {0:?}")]
    UnknownIdentifier(String),
}

/// Why a spectrum snapshot could not be read without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The analyzer has not completed a transform yet.
    NotPublished,
    /// The analyzer is swapping in a new frame right now. Retry on the next poll.
    Contended,
    /// The stored frame does not have the declared bin count.
    LengthMismatch { expected: usize, found: usize },
}

/// A spectrum snapshot read (or publish) could not complete without waiting.
///
/// Transient: callers treat it as "no new data this cycle" and poll again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("spectrum snapshot unavailable: {reason:?}")]
pub struct SnapshotUnavailable {
    pub reason: UnavailableReason,
}

impl SnapshotUnavailable {
    pub(crate) const fn new(reason: UnavailableReason) -> Self {
        Self { reason }
    }
}
