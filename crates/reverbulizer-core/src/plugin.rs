//! Plugin lifecycle and the per-block signal path.
//!
//! The lifecycle has two phases:
//!
//! - **[`Plugin`]** (unprepared): owns the [`SharedState`] but cannot process
//!   audio. Turns into a processor via [`Plugin::prepare()`] once the host
//!   reports sample rate, block size and channel layout.
//!
//! - **[`AudioProcessor`]** (prepared): owns all DSP state sized for that
//!   setup. Returns to the unprepared phase via [`AudioProcessor::unprepare()`]
//!   when the setup changes.
//!
//! Everything the host or the UI can observe lives in the shared state, so it
//! survives the round trip.

use std::sync::Arc;

use crate::buffer::Buffer;
use crate::config::PluginConfig;
use crate::envelope::EnvelopeFollower;
use crate::error::{PluginError, PluginResult};
use crate::parameter::ParameterId;
use crate::parameter_store::ParameterSnapshot;
use crate::reverb::{Reverb, ReverbState};
use crate::smoothing::{Smoother, SmoothingStyle};
use crate::spectrum::{bin_count, PushOutcome, SpectrumAnalyzer};
use crate::telemetry::SharedState;
use crate::types::gain_to_db;

/// Reported tail length while the reverb is not frozen, in seconds.
const TAIL_SECONDS: f64 = 5.0;

// =============================================================================
// Setup Types
// =============================================================================

/// Main bus channel counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusLayout {
    pub main_input_channels: u32,
    pub main_output_channels: u32,
}

impl BusLayout {
    /// 1 in, 1 out.
    pub const fn mono() -> Self {
        Self {
            main_input_channels: 1,
            main_output_channels: 1,
        }
    }

    /// 2 in, 2 out.
    pub const fn stereo() -> Self {
        Self {
            main_input_channels: 2,
            main_output_channels: 2,
        }
    }

    /// Accept mono→mono and stereo→stereo only.
    pub fn validate(&self) -> PluginResult<()> {
        match (self.main_input_channels, self.main_output_channels) {
            (1, 1) | (2, 2) => Ok(()),
            (inputs, outputs) => Err(PluginError::UnsupportedLayout { inputs, outputs }),
        }
    }
}

impl Default for BusLayout {
    fn default() -> Self {
        Self::stereo()
    }
}

/// What the host reports before processing starts.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSetup {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum number of samples per `process()` call.
    pub max_buffer_size: usize,
    pub layout: BusLayout,
}

impl AudioSetup {
    /// Reject setups the DSP cannot run with.
    pub fn validate(&self) -> PluginResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(PluginError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_buffer_size == 0 {
            return Err(PluginError::InvalidBlockSize(self.max_buffer_size));
        }
        self.layout.validate()
    }
}

// =============================================================================
// Lifecycle Traits
// =============================================================================

/// Unprepared plugin state.
pub trait Plugin: Send + 'static {
    /// The prepared processor created by [`Plugin::prepare()`].
    type Processor: AudioProcessor<Plugin = Self>;

    /// Validate `setup` and build a processor for it.
    ///
    /// Fails for unsupported layouts and unusable sample rates. This is the
    /// only fallible step; a prepared processor never fails.
    fn prepare(self, setup: AudioSetup) -> PluginResult<Self::Processor>;
}

/// Prepared plugin state, driven by the host's audio thread.
pub trait AudioProcessor: Send + 'static {
    /// The unprepared type [`unprepare()`](Self::unprepare) returns to.
    type Plugin: Plugin<Processor = Self>;

    /// Process one block in place.
    ///
    /// # Real-Time Safety
    ///
    /// Must not allocate, lock, or wait.
    fn process(&mut self, buffer: &mut Buffer);

    /// Return to the unprepared state, discarding DSP state.
    fn unprepare(self) -> Self::Plugin
    where
        Self: Sized;

    /// Called when the host activates or deactivates processing. Activation
    /// resets DSP state.
    fn set_active(&mut self, _active: bool) {}

    /// Tail length in samples. `u32::MAX` means infinite.
    fn tail_samples(&self) -> u32 {
        0
    }
}

// =============================================================================
// Reverbulizer
// =============================================================================

/// The unprepared Reverbulizer effect.
#[derive(Debug, Clone)]
pub struct Reverbulizer {
    shared: Arc<SharedState>,
    config: PluginConfig,
}

impl Reverbulizer {
    /// Create a plugin with fresh shared state.
    pub fn new(config: PluginConfig) -> Self {
        Self {
            shared: SharedState::new(&config),
            config,
        }
    }

    /// Create a plugin around existing shared state.
    ///
    /// The state's spectrum slot must be sized for `config.fft_order`;
    /// [`prepare()`](Plugin::prepare) rejects the plugin otherwise.
    pub fn with_shared(shared: Arc<SharedState>, config: PluginConfig) -> Self {
        Self { shared, config }
    }

    /// State shared with the bridge and the host.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// The analyzer must publish frames of exactly the length the shared
    /// slot was sized for.
    fn validate_spectrum(&self) -> PluginResult<()> {
        self.config.validate()?;
        let expected = bin_count(self.config.fft_order);
        let found = self.shared.spectrum.bins();
        if expected != found {
            return Err(PluginError::SpectrumSizeMismatch { expected, found });
        }
        Ok(())
    }
}

impl Default for Reverbulizer {
    fn default() -> Self {
        Self::new(PluginConfig::DEFAULT)
    }
}

impl Plugin for Reverbulizer {
    type Processor = ReverbProcessor;

    fn prepare(self, setup: AudioSetup) -> PluginResult<ReverbProcessor> {
        if let Err(err) = setup.validate().and_then(|()| self.validate_spectrum()) {
            log::warn!("{}: rejecting setup {:?}: {}", self.config.name, setup, err);
            return Err(err);
        }

        let sample_rate = setup.sample_rate as f32;
        let parameters_version = self.shared.parameters.version();
        let parameters = self.shared.parameters.snapshot();

        let mut gain = Smoother::new(SmoothingStyle::Linear(self.config.gain_ramp_ms));
        gain.prepare(sample_rate);
        gain.reset(parameters.gain);

        let mut envelope = EnvelopeFollower::new(
            self.config.envelope_attack_ms,
            self.config.envelope_release_ms,
        );
        envelope.prepare(sample_rate);

        let reverb_state = ReverbState::from_parameters(&parameters, self.config.freeze_threshold);
        let mut reverb = Reverb::new();
        reverb.prepare(sample_rate);
        reverb.set_state(reverb_state);
        reverb.reset();

        let analyzer = SpectrumAnalyzer::new(
            self.config.fft_order,
            self.config.spectrum_skew,
            Arc::clone(&self.shared.spectrum),
        );

        log::info!(
            "{}: prepared at {} Hz, max block {}, {}->{} channels, spectrum {} bins",
            self.config.name,
            setup.sample_rate,
            setup.max_buffer_size,
            setup.layout.main_input_channels,
            setup.layout.main_output_channels,
            analyzer.bins()
        );

        Ok(ReverbProcessor {
            shared: self.shared,
            config: self.config,
            setup,
            parameters,
            parameters_version,
            gain,
            envelope,
            reverb,
            analyzer,
        })
    }
}

/// The prepared Reverbulizer effect.
pub struct ReverbProcessor {
    shared: Arc<SharedState>,
    config: PluginConfig,
    setup: AudioSetup,
    /// Parameters as of the last store version this processor saw.
    parameters: ParameterSnapshot,
    parameters_version: u64,
    gain: Smoother,
    envelope: EnvelopeFollower,
    reverb: Reverb,
    analyzer: SpectrumAnalyzer,
}

impl ReverbProcessor {
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn setup(&self) -> &AudioSetup {
        &self.setup
    }

    /// The reverb as of the last processed block.
    pub fn reverb(&self) -> &Reverb {
        &self.reverb
    }

    fn apply_gain(&mut self, buffer: &mut Buffer, target: f32) {
        self.gain.set_target(target);
        // Every channel sees the same ramp.
        let start = self.gain.clone();
        for channel in buffer.channels_mut() {
            let mut ramp = start.clone();
            ramp.apply(channel);
            self.gain = ramp;
        }
    }

    /// Re-read the store only when something was written since the last
    /// block.
    fn refresh_parameters(&mut self) -> ParameterSnapshot {
        let version = self.shared.parameters.version();
        if version != self.parameters_version {
            self.parameters_version = version;
            self.parameters = self.shared.parameters.snapshot();
        }
        self.parameters
    }

    fn feed_analyzer(&mut self, buffer: &Buffer) {
        let left = buffer.channel(0);
        let right = buffer.channel(1);
        let stereo = !right.is_empty();

        for (i, &l) in left.iter().enumerate() {
            let sample = if stereo { (l + right[i]) * 0.5 } else { l };
            if self.analyzer.push_sample(sample) == PushOutcome::Dropped {
                self.shared.telemetry.record_dropped_frame();
            }
        }
    }
}

impl AudioProcessor for ReverbProcessor {
    type Plugin = Reverbulizer;

    fn process(&mut self, buffer: &mut Buffer) {
        let parameters = self.refresh_parameters();

        for channel in buffer.num_input_channels()..buffer.num_channels() {
            buffer.clear_channel(channel);
        }

        if parameters.mono_sum && buffer.num_input_channels() >= 2 {
            for channel in 1..buffer.num_channels() {
                buffer.copy_channel(0, channel);
            }
        }

        if parameters.bypass {
            return;
        }

        self.apply_gain(buffer, parameters.gain);

        let level = self.envelope.process(buffer);
        self.shared.telemetry.publish_level(gain_to_db(level));

        let state = ReverbState::from_parameters(&parameters, self.config.freeze_threshold);
        self.reverb.set_state(state);
        self.reverb.process(buffer);

        self.feed_analyzer(buffer);

        self.shared.telemetry.publish_reverb(&state);
    }

    fn unprepare(self) -> Reverbulizer {
        log::debug!("{}: unprepared", self.config.name);
        Reverbulizer {
            shared: self.shared,
            config: self.config,
        }
    }

    fn set_active(&mut self, active: bool) {
        if active {
            self.envelope.reset();
            self.reverb.reset();
            self.analyzer.reset();
            self.gain.reset(self.shared.parameters.get(ParameterId::Gain) as f32);
        }
        log::debug!("{}: active = {}", self.config.name, active);
    }

    fn tail_samples(&self) -> u32 {
        if self.reverb.is_frozen() {
            u32::MAX
        } else {
            (TAIL_SECONDS * self.setup.sample_rate) as u32
        }
    }
}

impl std::fmt::Debug for ReverbProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReverbProcessor")
            .field("setup", &self.setup)
            .field("reverb", &self.reverb.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::Originator;

    fn setup(layout: BusLayout) -> AudioSetup {
        AudioSetup {
            sample_rate: 48000.0,
            max_buffer_size: 256,
            layout,
        }
    }

    fn stereo_processor() -> ReverbProcessor {
        Reverbulizer::default().prepare(setup(BusLayout::stereo())).unwrap()
    }

    fn set(processor: &ReverbProcessor, id: ParameterId, value: f64) {
        processor
            .shared()
            .parameters
            .set(id, value, Originator::Host)
            .unwrap();
    }

    #[test]
    fn test_layout_validation() {
        assert!(BusLayout::mono().validate().is_ok());
        assert!(BusLayout::stereo().validate().is_ok());

        for (inputs, outputs) in [(1, 2), (2, 1), (6, 6), (0, 0)] {
            let layout = BusLayout {
                main_input_channels: inputs,
                main_output_channels: outputs,
            };
            let result = Reverbulizer::default().prepare(setup(layout));
            assert_eq!(
                result.unwrap_err(),
                PluginError::UnsupportedLayout { inputs, outputs }
            );
        }
    }

    #[test]
    fn test_invalid_setup() {
        let mut bad = setup(BusLayout::stereo());
        bad.sample_rate = 0.0;
        assert!(matches!(
            Reverbulizer::default().prepare(bad.clone()),
            Err(PluginError::InvalidSampleRate(_))
        ));

        bad.sample_rate = f64::NAN;
        assert!(Reverbulizer::default().prepare(bad.clone()).is_err());

        bad.sample_rate = 44100.0;
        bad.max_buffer_size = 0;
        assert_eq!(
            Reverbulizer::default().prepare(bad).unwrap_err(),
            PluginError::InvalidBlockSize(0)
        );
    }

    #[test]
    fn test_spectrum_slot_must_match_fft_order() {
        let config = PluginConfig::new("Small").with_fft_order(10);

        let mismatched = SharedState::new(&PluginConfig::DEFAULT);
        let plugin = Reverbulizer::with_shared(mismatched, config.clone());
        assert_eq!(
            plugin.prepare(setup(BusLayout::stereo())).unwrap_err(),
            PluginError::SpectrumSizeMismatch {
                expected: 256,
                found: 512
            }
        );

        let shared = SharedState::new(&config);
        let plugin = Reverbulizer::with_shared(Arc::clone(&shared), config);
        let mut processor = plugin.prepare(setup(BusLayout::stereo())).unwrap();
        for _ in 0..4 {
            let mut left = [0.25_f32; 256];
            let mut right = [0.25_f32; 256];
            processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 256));
        }
        assert_eq!(shared.spectrum.try_snapshot().unwrap().len(), 256);
    }

    #[test]
    fn test_fft_order_out_of_range() {
        for order in [3, 64] {
            let plugin = Reverbulizer::new(PluginConfig::new("Bad").with_fft_order(order));
            assert_eq!(
                plugin.prepare(setup(BusLayout::stereo())).unwrap_err(),
                PluginError::InvalidFftOrder(order)
            );
        }
    }

    #[test]
    fn test_writes_between_blocks_reach_next_block() {
        fn run(processor: &mut ReverbProcessor) -> f32 {
            let mut left = [0.0_f32; 64];
            let mut right = [0.0_f32; 64];
            processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 64));
            processor.shared().telemetry.width()
        }

        let mut processor = stereo_processor();
        assert_eq!(run(&mut processor), 0.75);

        set(&processor, ParameterId::Width, 0.2);
        assert_eq!(run(&mut processor), 0.2);
        assert_eq!(run(&mut processor), 0.2);

        processor.shared().parameters.undo();
        assert_eq!(run(&mut processor), 0.75);
    }

    #[test]
    fn test_gain_change_ramps_within_ramp_time() {
        let plugin = Reverbulizer::default();
        // Dry only: output is `input * gain * 2`.
        plugin
            .shared()
            .parameters
            .set(ParameterId::Mix, 0.0, Originator::Host)
            .unwrap();
        let mut processor = plugin.prepare(setup(BusLayout::stereo())).unwrap();

        let mut left = [1.0_f32; 128];
        let mut right = [1.0_f32; 128];
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 128));
        assert!(left.iter().all(|&s| s == 2.0));

        set(&processor, ParameterId::Gain, 0.0);
        let mut left = [1.0_f32; 128];
        let mut right = [1.0_f32; 128];
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 128));

        // 1 ms at 48 kHz.
        let ramp = 48;
        assert!(left[0] > 0.0 && left[0] < 2.0);
        for pair in left.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert!(left[ramp..].iter().all(|&s| s == 0.0));
        assert_eq!(left, right);
    }

    #[test]
    fn test_mono_sum_duplicates_channel_zero() {
        let mut processor = stereo_processor();
        set(&processor, ParameterId::MonoSum, 1.0);
        set(&processor, ParameterId::Bypass, 1.0);

        let mut left = [1.0_f32; 64];
        let mut right = [-1.0_f32; 64];
        let mut buffer = Buffer::new([&mut left[..], &mut right[..]], 2, 64);
        processor.process(&mut buffer);

        assert!(left.iter().all(|&s| s == 1.0));
        assert!(right.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_bypass_is_bit_exact_and_keeps_telemetry() {
        let mut processor = stereo_processor();

        let mut left: Vec<f32> = (0..128).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut right: Vec<f32> = (0..128).map(|i| (i as f32 * 0.07).cos()).collect();
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 128));
        let before = processor.shared().telemetry.snapshot();
        assert_eq!(before.blocks_processed, 1);

        set(&processor, ParameterId::Bypass, 1.0);
        let input_left = left.clone();
        let input_right = right.clone();
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 128));

        assert_eq!(left, input_left);
        assert_eq!(right, input_right);
        assert_eq!(processor.shared().telemetry.snapshot(), before);
    }

    #[test]
    fn test_unmatched_outputs_cleared() {
        let mut processor = stereo_processor();
        set(&processor, ParameterId::Mix, 0.0);

        let mut left = [0.5_f32; 32];
        let mut right = [0.9_f32; 32];
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 1, 32));

        assert!(right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_level_telemetry() {
        let mut processor = stereo_processor();
        assert_eq!(processor.shared().telemetry.output_level_db(), -100.0);

        let mut left = [0.5_f32; 256];
        let mut right = [0.5_f32; 256];
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 256));

        let level = processor.shared().telemetry.output_level_db();
        assert!(level > -100.0 && level < 0.0);
    }

    #[test]
    fn test_reverb_telemetry_follows_parameters() {
        let mut processor = stereo_processor();
        set(&processor, ParameterId::RoomSize, 0.9);
        set(&processor, ParameterId::Freeze, 0.5);

        let mut mono = [0.0_f32; 64];
        let mut buffer = Buffer::new([&mut mono[..]], 1, 64);
        processor.process(&mut buffer);

        let telemetry = processor.shared().telemetry.snapshot();
        assert_eq!(telemetry.room_size, 0.9);
        assert!(telemetry.frozen);
        assert_eq!(processor.tail_samples(), u32::MAX);
    }

    #[test]
    fn test_tail_and_round_trip() {
        let processor = stereo_processor();
        assert_eq!(processor.tail_samples(), 240_000);

        let shared = Arc::clone(processor.shared());
        let plugin = processor.unprepare();
        assert!(Arc::ptr_eq(plugin.shared(), &shared));

        let mono = plugin.prepare(setup(BusLayout::mono())).unwrap();
        assert_eq!(mono.setup().layout, BusLayout::mono());
    }

    #[test]
    fn test_set_active_clears_tail() {
        let mut processor = stereo_processor();
        let mut left = [1.0_f32; 256];
        let mut right = [1.0_f32; 256];
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, 256));
        assert!(processor.reverb().tail_energy() > 0.0);

        processor.set_active(true);
        assert_eq!(processor.reverb().tail_energy(), 0.0);
    }
}
