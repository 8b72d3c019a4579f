//! Spectrum analyzer feeding the shared [`SpectrumSlot`].
//!
//! Samples are accumulated one at a time. Once `N = 2^fft_order` samples are
//! in, the block is Hann-windowed, transformed, mapped onto `N / 4`
//! log-skewed output bins normalized to `0.0..=1.0`, and published. All
//! buffers (including the FFT scratch space) are allocated up front, so
//! [`SpectrumAnalyzer::push_sample()`] is safe on the audio thread.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::snapshot::SpectrumSlot;
use crate::types::{gain_to_db, MINUS_INFINITY_DB};

/// What happened to a pushed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Still filling the accumulator.
    Accumulating,
    /// The accumulator was full; a new frame was published.
    Published,
    /// The accumulator was full but the slot was held by a reader. The frame
    /// was discarded and the previous snapshot stays visible.
    Dropped,
}

/// Number of output bins for an FFT of order `fft_order`, or 0 if
/// `2^fft_order` does not fit in a `usize`.
pub const fn bin_count(fft_order: u32) -> usize {
    match 1usize.checked_shl(fft_order) {
        Some(size) => size / 4,
        None => 0,
    }
}

/// Hann-windowed FFT spectrum analyzer.
pub struct SpectrumAnalyzer {
    fifo: Vec<f32>,
    fifo_len: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Magnitude index sampled by each output bin.
    bin_indices: Vec<usize>,
    /// `gain_to_db(N)`, subtracted so a full-scale bin maps near 0 dB.
    reference_db: f32,
    levels: Vec<f32>,
    slot: Arc<SpectrumSlot>,
}

impl SpectrumAnalyzer {
    /// Plan an FFT of size `2^fft_order` that publishes into `slot`.
    ///
    /// `skew` shapes the output bin spacing; values below 1 spend more bins
    /// on low frequencies.
    pub fn new(fft_order: u32, skew: f32, slot: Arc<SpectrumSlot>) -> Self {
        let size = 1usize << fft_order;
        let bins = bin_count(fft_order);
        let half = size / 2;

        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        let window = (0..size)
            .map(|i| {
                let phase = std::f32::consts::TAU * i as f32 / size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        let bin_indices = (0..bins)
            .map(|i| {
                let proportion = 1.0 - ((1.0 - i as f32 / bins as f32).ln() * skew).exp();
                ((proportion * half as f32) as usize).min(half)
            })
            .collect();

        Self {
            fifo: vec![0.0; size],
            fifo_len: 0,
            window,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
            bin_indices,
            reference_db: gain_to_db(size as f32),
            levels: Vec::with_capacity(bins),
            slot,
        }
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.fifo.len()
    }

    /// Output bin count (`size / 4`).
    pub fn bins(&self) -> usize {
        self.bin_indices.len()
    }

    /// The slot frames are published into.
    pub fn slot(&self) -> &Arc<SpectrumSlot> {
        &self.slot
    }

    /// Discard accumulated samples.
    pub fn reset(&mut self) {
        self.fifo_len = 0;
    }

    /// Append one mono sample. Runs the transform when the accumulator fills.
    #[inline]
    pub fn push_sample(&mut self, sample: f32) -> PushOutcome {
        self.fifo[self.fifo_len] = sample;
        self.fifo_len += 1;
        if self.fifo_len < self.fifo.len() {
            return PushOutcome::Accumulating;
        }

        self.fifo_len = 0;
        self.render();
        if self.slot.try_publish(&mut self.levels) {
            PushOutcome::Published
        } else {
            PushOutcome::Dropped
        }
    }

    /// Window, transform and map the accumulator into `self.levels`.
    fn render(&mut self) {
        for ((out, &sample), &w) in self.buffer.iter_mut().zip(&self.fifo).zip(&self.window) {
            *out = Complex::new(sample * w, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // `levels` may be the buffer handed back by the slot; its capacity is
        // already `bins`.
        self.levels.clear();
        for &index in &self.bin_indices {
            let magnitude = self.buffer[index].norm();
            let db = (gain_to_db(magnitude) - self.reference_db).clamp(MINUS_INFINITY_DB, 0.0);
            self.levels.push((db - MINUS_INFINITY_DB) / -MINUS_INFINITY_DB);
        }
    }
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("size", &self.size())
            .field("bins", &self.bins())
            .field("fifo_len", &self.fifo_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: u32 = 11;

    fn analyzer() -> SpectrumAnalyzer {
        let slot = Arc::new(SpectrumSlot::new(bin_count(ORDER)));
        SpectrumAnalyzer::new(ORDER, 0.2, slot)
    }

    #[test]
    fn test_publishes_once_per_fft_size() {
        let mut analyzer = analyzer();
        assert_eq!(analyzer.size(), 2048);
        assert_eq!(analyzer.bins(), 512);

        for _ in 0..2047 {
            assert_eq!(analyzer.push_sample(0.0), PushOutcome::Accumulating);
        }
        assert_eq!(analyzer.push_sample(0.0), PushOutcome::Published);
        assert_eq!(analyzer.push_sample(0.0), PushOutcome::Accumulating);
        assert_eq!(analyzer.slot().generation(), 1);
    }

    #[test]
    fn test_bin_mapping_is_monotonic_and_bounded() {
        let analyzer = analyzer();
        assert_eq!(analyzer.bin_indices[0], 0);
        for pair in analyzer.bin_indices.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(analyzer.bin_indices.iter().all(|&i| i <= 1024));
    }

    #[test]
    fn test_silence_maps_to_zero() {
        let mut analyzer = analyzer();
        for _ in 0..2048 {
            analyzer.push_sample(0.0);
        }
        let levels = analyzer.slot().try_snapshot().unwrap();
        assert_eq!(levels.len(), 512);
        assert!(levels.iter().all(|&l| l == 0.0));
    }

    #[test]
    fn test_sine_peaks_in_low_bins() {
        let mut analyzer = analyzer();
        for n in 0..2048 {
            let phase = std::f32::consts::TAU * 1000.0 * n as f32 / 48000.0;
            analyzer.push_sample(phase.sin());
        }
        let levels = analyzer.slot().try_snapshot().unwrap();
        assert!(levels.iter().all(|&l| (0.0..=1.0).contains(&l)));

        let (loudest, &peak) = levels
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert!(loudest < levels.len() / 2);
        assert!(peak > 0.5);
    }

    #[test]
    fn test_dropped_when_slot_held() {
        let mut analyzer = analyzer();
        let slot = Arc::clone(analyzer.slot());

        for _ in 0..2048 {
            analyzer.push_sample(0.1);
        }
        let mut frame = Vec::new();
        slot.try_read_into(&mut frame).unwrap();

        // A reader holding the lock forces the next frame to be dropped.
        let guard = slot.read_guard();
        let mut outcome = PushOutcome::Accumulating;
        for _ in 0..2048 {
            outcome = analyzer.push_sample(0.5);
        }
        assert_eq!(outcome, PushOutcome::Dropped);
        drop(guard);

        assert_eq!(slot.generation(), 1);
        assert_eq!(slot.try_snapshot().unwrap(), frame);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut analyzer = analyzer();
        for _ in 0..1000 {
            analyzer.push_sample(1.0);
        }
        analyzer.reset();
        for _ in 0..2047 {
            assert_eq!(analyzer.push_sample(0.0), PushOutcome::Accumulating);
        }
    }
}
