//! Freeverb-style stereo reverb with freeze.
//!
//! Eight damped comb filters in parallel feed four all-pass filters in
//! series, per channel. The right channel's delay lines are offset by a
//! small stereo spread. All delay lengths are given at 44.1 kHz and scaled
//! to the prepared sample rate.

use crate::buffer::Buffer;
use crate::parameter_store::ParameterSnapshot;
use crate::smoothing::{Smoother, SmoothingStyle};

const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const REFERENCE_RATE: f32 = 44100.0;

const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;
const INPUT_GAIN: f32 = 0.015;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Coefficient ramp time.
const COEFFICIENT_RAMP_MS: f32 = 10.0;

/// Reverb settings derived from the parameters once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbState {
    pub room_size: f32,
    pub damping: f32,
    pub wet_level: f32,
    pub dry_level: f32,
    pub width: f32,
    pub freeze: bool,
}

impl ReverbState {
    /// Map parameter values onto reverb settings. Freeze engages at or above
    /// `freeze_threshold`.
    pub fn from_parameters(parameters: &ParameterSnapshot, freeze_threshold: f32) -> Self {
        Self {
            room_size: parameters.room_size,
            damping: parameters.damping,
            wet_level: parameters.mix,
            dry_level: 1.0 - parameters.mix,
            width: parameters.width,
            freeze: parameters.freeze >= freeze_threshold,
        }
    }
}

impl Default for ReverbState {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
            width: 1.0,
            freeze: false,
        }
    }
}

/// Lowpass-damped feedback comb.
#[derive(Debug, Clone, Default)]
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    last: f32,
}

impl Comb {
    fn allocate(&mut self, length: usize) {
        self.buffer = vec![0.0; length.max(1)];
        self.index = 0;
        self.last = 0.0;
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.index];
        self.last = output * (1.0 - damp) + self.last * damp;
        self.buffer[self.index] = input + self.last * feedback;
        self.index += 1;
        if self.index == self.buffer.len() {
            self.index = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.last = 0.0;
    }

    fn energy(&self) -> f32 {
        self.buffer.iter().map(|s| s * s).sum()
    }
}

/// Schroeder all-pass with fixed 0.5 feedback.
#[derive(Debug, Clone, Default)]
struct AllPass {
    buffer: Vec<f32>,
    index: usize,
}

impl AllPass {
    fn allocate(&mut self, length: usize) {
        self.buffer = vec![0.0; length.max(1)];
        self.index = 0;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index += 1;
        if self.index == self.buffer.len() {
            self.index = 0;
        }
        buffered - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// One channel's comb bank and all-pass chain.
#[derive(Debug, Clone, Default)]
struct Network {
    combs: [Comb; 8],
    allpasses: [AllPass; 4],
}

impl Network {
    fn allocate(&mut self, scale: f32, spread: usize) {
        for (comb, tuning) in self.combs.iter_mut().zip(COMB_TUNINGS) {
            comb.allocate(((tuning + spread) as f32 * scale) as usize);
        }
        for (allpass, tuning) in self.allpasses.iter_mut().zip(ALLPASS_TUNINGS) {
            allpass.allocate(((tuning + spread) as f32 * scale) as usize);
        }
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input, damp, feedback);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(Comb::clear);
        self.allpasses.iter_mut().for_each(AllPass::clear);
    }

    fn energy(&self) -> f32 {
        self.combs.iter().map(Comb::energy).sum()
    }
}

/// Stereo reverb with smoothed coefficients.
///
/// Delay lines are allocated in [`prepare()`](Self::prepare); processing is
/// allocation-free.
#[derive(Debug, Clone)]
pub struct Reverb {
    state: ReverbState,
    left: Network,
    right: Network,
    input_gain: f32,
    damping: Smoother,
    feedback: Smoother,
    dry: Smoother,
    wet1: Smoother,
    wet2: Smoother,
}

impl Reverb {
    pub fn new() -> Self {
        let ramp = || Smoother::new(SmoothingStyle::Linear(COEFFICIENT_RAMP_MS));
        let mut reverb = Self {
            state: ReverbState::default(),
            left: Network::default(),
            right: Network::default(),
            input_gain: INPUT_GAIN,
            damping: ramp(),
            feedback: ramp(),
            dry: ramp(),
            wet1: ramp(),
            wet2: ramp(),
        };
        reverb.update_targets();
        reverb.snap_coefficients();
        reverb
    }

    /// Size the delay lines for `sample_rate` and clear all state.
    pub fn prepare(&mut self, sample_rate: f32) {
        let scale = sample_rate / REFERENCE_RATE;
        self.left.allocate(scale, 0);
        self.right.allocate(scale, STEREO_SPREAD);

        for smoother in self.smoothers_mut() {
            smoother.prepare(sample_rate);
        }
        self.snap_coefficients();
    }

    /// Settings currently applied.
    pub fn state(&self) -> ReverbState {
        self.state
    }

    /// Returns true while the tail is being held.
    pub fn is_frozen(&self) -> bool {
        self.state.freeze
    }

    /// Retarget the coefficients. Changes ramp in over ~10 ms.
    pub fn set_state(&mut self, state: ReverbState) {
        if state != self.state {
            self.state = state;
            self.update_targets();
        }
    }

    /// Clear the delay lines and jump to the target coefficients.
    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.snap_coefficients();
    }

    /// Sum of squares held in the comb delay lines of both channels.
    pub fn tail_energy(&self) -> f32 {
        self.left.energy() + self.right.energy()
    }

    /// Process channel 0 (mono) or channels 0 and 1 (stereo) in place.
    pub fn process(&mut self, buffer: &mut Buffer) {
        if buffer.num_channels() >= 2 {
            if let Some((left, right)) = buffer.stereo_mut() {
                self.process_stereo(left, right);
            }
        } else if let Some(mono) = buffer.channel_mut(0) {
            self.process_mono(mono);
        }
    }

    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let damp = self.damping.next();
            let feedback = self.feedback.next();
            let input = (*l + *r) * self.input_gain;

            let out_l = self.left.process(input, damp, feedback);
            let out_r = self.right.process(input, damp, feedback);

            let dry = self.dry.next();
            let wet1 = self.wet1.next();
            let wet2 = self.wet2.next();
            *l = out_l * wet1 + out_r * wet2 + *l * dry;
            *r = out_r * wet1 + out_l * wet2 + *r * dry;
        }
    }

    pub fn process_mono(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            let damp = self.damping.next();
            let feedback = self.feedback.next();
            let input = *s * self.input_gain;

            let out = self.left.process(input, damp, feedback);

            let dry = self.dry.next();
            let wet1 = self.wet1.next();
            *s = out * wet1 + *s * dry;
        }
    }

    fn update_targets(&mut self) {
        let state = self.state;
        let wet = state.wet_level * WET_SCALE;
        self.dry.set_target(state.dry_level * DRY_SCALE);
        self.wet1.set_target(0.5 * wet * (1.0 + state.width));
        self.wet2.set_target(0.5 * wet * (1.0 - state.width));

        if state.freeze {
            self.input_gain = 0.0;
            self.damping.set_target(0.0);
            self.feedback.set_target(1.0);
        } else {
            self.input_gain = INPUT_GAIN;
            self.damping.set_target(state.damping * DAMP_SCALE);
            self.feedback.set_target(state.room_size * ROOM_SCALE + ROOM_OFFSET);
        }
    }

    fn snap_coefficients(&mut self) {
        for smoother in self.smoothers_mut() {
            let target = smoother.target();
            smoother.reset(target);
        }
    }

    fn smoothers_mut(&mut self) -> [&mut Smoother; 5] {
        [
            &mut self.damping,
            &mut self.feedback,
            &mut self.dry,
            &mut self.wet1,
            &mut self.wet2,
        ]
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    fn state(freeze: bool) -> ReverbState {
        ReverbState {
            room_size: 0.8,
            damping: 0.5,
            wet_level: 1.0,
            dry_level: 0.0,
            width: 1.0,
            freeze,
        }
    }

    fn excite(reverb: &mut Reverb) {
        let mut left = vec![0.0_f32; 4800];
        let mut right = vec![0.0_f32; 4800];
        left[0] = 1.0;
        right[0] = 1.0;
        reverb.process_stereo(&mut left, &mut right);
    }

    fn run_silence(reverb: &mut Reverb, samples: usize) {
        let mut left = vec![0.0_f32; 480];
        let mut right = vec![0.0_f32; 480];
        for _ in 0..samples / 480 {
            left.fill(0.0);
            right.fill(0.0);
            reverb.process_stereo(&mut left, &mut right);
        }
    }

    #[test]
    fn test_state_from_parameters() {
        let snapshot = ParameterSnapshot {
            gain: 1.0,
            bypass: false,
            mono_sum: false,
            room_size: 0.5,
            mix: 0.75,
            width: 0.75,
            damping: 0.5,
            freeze: 0.5,
        };
        let state = ReverbState::from_parameters(&snapshot, 0.5);
        assert_eq!(state.wet_level, 0.75);
        assert_eq!(state.dry_level, 0.25);
        assert!(state.freeze);
        assert!(!ReverbState::from_parameters(&snapshot, 0.6).freeze);
    }

    #[test]
    fn test_delay_lengths_scale() {
        let mut reverb = Reverb::new();
        reverb.prepare(88200.0);
        assert_eq!(reverb.left.combs[0].buffer.len(), 2232);
        assert_eq!(reverb.right.combs[0].buffer.len(), 2278);
        assert_eq!(reverb.left.allpasses[3].buffer.len(), 450);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut reverb = Reverb::new();
        reverb.prepare(SAMPLE_RATE);
        let mut left = [0.0_f32; 256];
        let mut right = [0.0_f32; 256];
        reverb.process_stereo(&mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        assert_eq!(reverb.tail_energy(), 0.0);
    }

    #[test]
    fn test_tail_decays_without_freeze() {
        let mut reverb = Reverb::new();
        reverb.prepare(SAMPLE_RATE);
        reverb.set_state(state(false));
        reverb.reset();

        excite(&mut reverb);
        let start = reverb.tail_energy();
        assert!(start > 0.0);

        run_silence(&mut reverb, SAMPLE_RATE as usize * 5);
        assert!(reverb.tail_energy() < start * 1e-3);
    }

    #[test]
    fn test_freeze_holds_tail() {
        let mut reverb = Reverb::new();
        reverb.prepare(SAMPLE_RATE);
        reverb.set_state(state(false));
        reverb.reset();
        excite(&mut reverb);

        reverb.set_state(state(true));
        // Let the coefficient ramp settle.
        run_silence(&mut reverb, 960);
        let frozen = reverb.tail_energy();
        assert!(frozen > 0.0);

        run_silence(&mut reverb, SAMPLE_RATE as usize * 5);
        let after = reverb.tail_energy();
        assert!(after >= frozen * 0.999);
    }

    #[test]
    fn test_dry_only_passes_input() {
        let mut reverb = Reverb::new();
        reverb.prepare(SAMPLE_RATE);
        reverb.set_state(ReverbState {
            wet_level: 0.0,
            dry_level: 0.5,
            ..state(false)
        });
        reverb.reset();

        let mut mono = [0.25_f32; 64];
        reverb.process_mono(&mut mono);
        // Dry gain is dry_level * 2.
        assert!(mono.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }
}
