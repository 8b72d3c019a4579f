//! Ballistic peak follower used for output level metering.

use crate::buffer::Buffer;
use crate::types::MAX_CHANNELS;

/// Envelope values below this are flushed to zero to avoid denormals.
const FLUSH_THRESHOLD: f32 = 1e-8;

/// Pole coefficient for a ballistics time constant.
///
/// `exp(-2π·1000 / (sr·t_ms))`. Zero time means instant response.
fn ballistics_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    if time_ms <= 0.0 || sample_rate <= 0.0 {
        0.0
    } else {
        (-std::f32::consts::TAU * 1000.0 / (sample_rate * time_ms)).exp()
    }
}

/// Peak follower with separate attack and release times, one state per
/// channel.
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    attack_ms: f32,
    release_ms: f32,
    attack_coeff: f32,
    release_coeff: f32,
    state: [f32; MAX_CHANNELS],
}

impl EnvelopeFollower {
    pub fn new(attack_ms: f32, release_ms: f32) -> Self {
        Self {
            attack_ms,
            release_ms,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            state: [0.0; MAX_CHANNELS],
        }
    }

    /// Compute the coefficients for `sample_rate` and clear the state.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.attack_coeff = ballistics_coeff(self.attack_ms, sample_rate);
        self.release_coeff = ballistics_coeff(self.release_ms, sample_rate);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = [0.0; MAX_CHANNELS];
    }

    /// Advance one channel by one sample.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, sample: f32) -> f32 {
        let x = sample.abs();
        let previous = self.state[channel];
        let coeff = if x > previous {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        let mut y = x + coeff * (previous - x);
        if y < FLUSH_THRESHOLD {
            y = 0.0;
        }
        self.state[channel] = y;
        y
    }

    /// Run every channel of `buffer` through the follower and return the
    /// envelope of channel 0 at the last sample.
    pub fn process(&mut self, buffer: &Buffer) -> f32 {
        let channels = buffer.num_channels().min(MAX_CHANNELS);
        for channel in 0..channels {
            for &sample in buffer.channel(channel) {
                self.process_sample(channel, sample);
            }
        }
        self.state[0]
    }

    /// Current envelope of a channel.
    pub fn level(&self, channel: usize) -> f32 {
        self.state.get(channel).copied().unwrap_or(0.0)
    }
}
