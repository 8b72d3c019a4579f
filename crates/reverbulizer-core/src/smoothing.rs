//! Per-sample value ramps.
//!
//! [`Smoother`] turns block-rate parameter reads into per-sample values so
//! gain changes do not click and reverb coefficients do not zipper.
//!
//! ```ignore
//! let mut gain = Smoother::new(SmoothingStyle::Linear(1.0));
//! gain.prepare(48000.0);
//! gain.reset(1.0);
//! gain.set_target(0.5);
//! let g = gain.next(); // once per sample
//! ```
//!
//! A `Smoother` is owned by the audio thread and needs `&mut self` to advance.

/// Ramp shape. The `f32` payload is the ramp time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SmoothingStyle {
    /// Jump to the target immediately.
    #[default]
    None,

    /// Constant step per sample, arriving exactly after the given time.
    /// Never overshoots and never reverses direction.
    Linear(f32),
}

/// Ramps from the current value to a target, one sample at a time.
#[derive(Debug, Clone)]
pub struct Smoother {
    style: SmoothingStyle,
    sample_rate: f32,
    current: f32,
    target: f32,
    /// Per-sample increment of the running ramp.
    step: f32,
    remaining: u32,
}

impl Smoother {
    /// Create a smoother. [`prepare()`](Self::prepare) must run before the
    /// first ramp, otherwise targets are applied instantly.
    pub fn new(style: SmoothingStyle) -> Self {
        Self {
            style,
            sample_rate: 0.0,
            current: 0.0,
            target: 0.0,
            step: 0.0,
            remaining: 0,
        }
    }

    pub fn style(&self) -> SmoothingStyle {
        self.style
    }

    /// Bind to a sample rate. Ramps already running keep their step.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Jump to `value` and stop ramping.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.remaining = 0;
        self.step = 0.0;
    }

    /// Start ramping toward `target` from wherever the ramp currently is.
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;

        match self.style {
            SmoothingStyle::None => self.current = target,
            SmoothingStyle::Linear(ms) => {
                let samples = (ms * 0.001 * self.sample_rate) as u32;
                if samples == 0 {
                    self.current = target;
                    self.remaining = 0;
                } else {
                    self.remaining = samples;
                    self.step = (target - self.current) / samples as f32;
                }
            }
        }
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        match self.style {
            SmoothingStyle::None => {}
            SmoothingStyle::Linear(_) => {
                if self.remaining > 0 {
                    self.remaining -= 1;
                    self.current = if self.remaining == 0 {
                        self.target
                    } else if self.step > 0.0 {
                        (self.current + self.step).min(self.target)
                    } else {
                        (self.current + self.step).max(self.target)
                    };
                }
            }
        }
        self.current
    }

    /// Value the last [`next()`](Self::next) returned.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Returns true while the value is still moving.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        match self.style {
            SmoothingStyle::None => false,
            SmoothingStyle::Linear(_) => self.remaining > 0,
        }
    }

    /// Multiply `samples` by successive ramp values.
    pub fn apply(&mut self, samples: &mut [f32]) {
        if !self.is_smoothing() {
            let gain = self.current;
            samples.iter_mut().for_each(|s| *s *= gain);
            return;
        }
        for sample in samples.iter_mut() {
            *sample *= self.next();
        }
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmoothingStyle::None)
    }
}
