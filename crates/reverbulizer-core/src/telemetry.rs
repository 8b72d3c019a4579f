//! Scalar telemetry published by the audio thread, and the shared state
//! bundle.
//!
//! Every value is a single atomic word replaced wholesale once per block, so
//! readers on any thread see some completed block's value without locking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::PluginConfig;
use crate::parameter_store::ParameterStore;
use crate::reverb::ReverbState;
use crate::snapshot::SpectrumSlot;
use crate::spectrum::bin_count;
use crate::types::{AtomicF32, MINUS_INFINITY_DB};

/// Telemetry values captured at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    /// Output level of channel 0 in dB (floor -100).
    pub output_level_db: f32,
    pub frozen: bool,
    pub mix: f32,
    pub room_size: f32,
    pub width: f32,
    pub damp: f32,
    /// Blocks processed (excluding bypassed blocks).
    pub blocks_processed: u64,
    /// Spectrum frames discarded because a reader held the snapshot.
    pub dropped_spectrum_frames: u64,
}

/// Lock-free telemetry scalars.
#[derive(Debug)]
pub struct Telemetry {
    output_level_db: AtomicF32,
    frozen: AtomicBool,
    mix: AtomicF32,
    room_size: AtomicF32,
    width: AtomicF32,
    damp: AtomicF32,
    blocks_processed: AtomicU64,
    dropped_spectrum_frames: AtomicU64,
}

impl Telemetry {
    /// Telemetry mirroring the parameter defaults with a silent level.
    pub fn new() -> Self {
        use crate::parameter::ParameterId;
        let default = |id: ParameterId| AtomicF32::new(id.info().default as f32);
        Self {
            output_level_db: AtomicF32::new(MINUS_INFINITY_DB),
            frozen: AtomicBool::new(false),
            mix: default(ParameterId::Mix),
            room_size: default(ParameterId::RoomSize),
            width: default(ParameterId::Width),
            damp: default(ParameterId::Damping),
            blocks_processed: AtomicU64::new(0),
            dropped_spectrum_frames: AtomicU64::new(0),
        }
    }

    /// Publish the block's output level.
    #[inline]
    pub fn publish_level(&self, db: f32) {
        self.output_level_db.store(db, Ordering::Relaxed);
    }

    /// Publish the reverb settings that were just applied and mark the
    /// block complete.
    #[inline]
    pub fn publish_reverb(&self, state: &ReverbState) {
        self.frozen.store(state.freeze, Ordering::Relaxed);
        self.mix.store(state.wet_level, Ordering::Relaxed);
        self.room_size.store(state.room_size, Ordering::Relaxed);
        self.width.store(state.width, Ordering::Relaxed);
        self.damp.store(state.damping, Ordering::Relaxed);
        self.blocks_processed.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn record_dropped_frame(&self) {
        self.dropped_spectrum_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn output_level_db(&self) -> f32 {
        self.output_level_db.load(Ordering::Relaxed)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Relaxed)
    }

    pub fn mix(&self) -> f32 {
        self.mix.load(Ordering::Relaxed)
    }

    pub fn room_size(&self) -> f32 {
        self.room_size.load(Ordering::Relaxed)
    }

    pub fn width(&self) -> f32 {
        self.width.load(Ordering::Relaxed)
    }

    pub fn damp(&self) -> f32 {
        self.damp.load(Ordering::Relaxed)
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed.load(Ordering::Acquire)
    }

    pub fn dropped_spectrum_frames(&self) -> u64 {
        self.dropped_spectrum_frames.load(Ordering::Relaxed)
    }

    /// Read every value.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let blocks_processed = self.blocks_processed();
        TelemetrySnapshot {
            output_level_db: self.output_level_db(),
            frozen: self.is_frozen(),
            mix: self.mix(),
            room_size: self.room_size(),
            width: self.width(),
            damp: self.damp(),
            blocks_processed,
            dropped_spectrum_frames: self.dropped_spectrum_frames(),
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the processor, the bridge and the host.
#[derive(Debug)]
pub struct SharedState {
    pub parameters: ParameterStore,
    pub telemetry: Telemetry,
    pub spectrum: Arc<SpectrumSlot>,
}

impl SharedState {
    pub fn new(config: &PluginConfig) -> Arc<Self> {
        Arc::new(Self {
            parameters: ParameterStore::new(config.undo_limit),
            telemetry: Telemetry::new(),
            spectrum: Arc::new(SpectrumSlot::new(bin_count(config.fft_order))),
        })
    }
}
