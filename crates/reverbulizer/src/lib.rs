//! # Reverbulizer
//!
//! Stereo reverb effect with a live telemetry bridge.
//!
//! ## Architecture
//!
//! ```text
//! host audio callback
//!        ↓
//! ReverbProcessor (gain → envelope → reverb → spectrum analyzer)
//!        ↓ publishes
//! SharedState (ParameterStore, Telemetry, SpectrumSlot)
//!        ↑ reads / writes
//! Bridge (pull endpoints, push events, commands)
//!        ↕
//! remote UI
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reverbulizer::prelude::*;
//!
//! let plugin = Reverbulizer::new(PluginConfig::DEFAULT);
//! let bridge = Bridge::start(plugin.shared().clone(), BridgeConfig::new())?;
//!
//! let setup = AudioSetup {
//!     sample_rate: 48_000.0,
//!     max_buffer_size: 512,
//!     layout: BusLayout::stereo(),
//! };
//! let mut processor = plugin.prepare(setup)?;
//! processor.set_active(true);
//!
//! // In the audio callback:
//! processor.process(&mut buffer);
//!
//! // Anywhere else:
//! let completion = bridge.invoke("undo", vec![]);
//! ```

// Re-export sub-crates
pub use reverbulizer_bridge as bridge;
pub use reverbulizer_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use reverbulizer::prelude::*;
/// ```
pub mod prelude {
    pub use reverbulizer_core::{
        // Buffer and lifecycle
        AudioProcessor, AudioSetup, Buffer, BusLayout, Plugin, PluginConfig, ReverbProcessor,
        Reverbulizer, MAX_CHANNELS, MINUS_INFINITY_DB,
        // Parameters and history
        HistoryOutcome, Originator, ParameterId, ParameterInfo, ParameterKind, ParameterSnapshot,
        ParameterStore,
        // DSP building blocks
        EnvelopeFollower, Reverb, ReverbState, Smoother, SmoothingStyle, SpectrumAnalyzer,
        // Shared state
        SharedState, SpectrumSlot, Telemetry, TelemetrySnapshot,
        // Error types
        ParameterError, PluginError, PluginResult, SnapshotUnavailable, UnavailableReason,
    };

    pub use reverbulizer_bridge::{
        Bridge, BridgeConfig, BridgeError, BridgeResult, ChannelSink, Command, CommandCompletion,
        Endpoint, EventSink, KeyPress, PushEvent, Record, Resource,
    };
}
