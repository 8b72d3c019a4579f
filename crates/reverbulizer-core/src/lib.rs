//! # reverbulizer-core
//!
//! Real-time core of the Reverbulizer effect.
//!
//! This crate owns everything that runs on (or is read from) the audio
//! thread. It spawns no threads of its own; the bridge crate and the host
//! drive it.
//!
//! ## Main Types
//!
//! - [`ParameterStore`] - Atomic parameter values with undo/redo
//! - [`Reverbulizer`] / [`ReverbProcessor`] - Two-phase plugin lifecycle and signal path
//! - [`SpectrumAnalyzer`] / [`SpectrumSlot`] - FFT analysis and try-acquire publication
//! - [`Telemetry`] - Lock-free level and reverb scalars
//! - [`SharedState`] - Everything the processor shares with other threads
//! - [`Buffer`] - Planar in-place audio block

pub mod buffer;
pub mod config;
pub mod envelope;
pub mod error;
pub mod parameter;
pub mod parameter_store;
pub mod plugin;
pub mod reverb;
pub mod smoothing;
pub mod snapshot;
pub mod spectrum;
pub mod telemetry;
pub mod types;
pub mod undo;

// Re-exports for convenience
pub use buffer::Buffer;
pub use config::{PluginConfig, DEFAULT_UNDO_LIMIT, FFT_ORDER_RANGE};
pub use envelope::EnvelopeFollower;
pub use error::{ParameterError, PluginError, PluginResult, SnapshotUnavailable, UnavailableReason};
pub use parameter::{ParameterId, ParameterInfo, ParameterKind, CONTINUOUS_STEP};
pub use parameter_store::{ParameterSnapshot, ParameterStore};
pub use plugin::{AudioProcessor, AudioSetup, BusLayout, Plugin, ReverbProcessor, Reverbulizer};
pub use reverb::{Reverb, ReverbState};
pub use smoothing::{Smoother, SmoothingStyle};
pub use snapshot::SpectrumSlot;
pub use spectrum::{bin_count, PushOutcome, SpectrumAnalyzer};
pub use telemetry::{SharedState, Telemetry, TelemetrySnapshot};
pub use types::{gain_to_db, AtomicF32, ParameterValue, MAX_CHANNELS, MINUS_INFINITY_DB};
pub use undo::{Action, HistoryOutcome, Originator, UndoHistory};
