//! In-place audio buffer handed to the processor each block.
//!
//! The host delivers planar `f32` channels that serve as both input and
//! output. Only the first [`num_input_channels()`](Buffer::num_input_channels)
//! carry input; the remaining channels are outputs the processor has to fill
//! (or clear).
//!
//! # Real-Time Safety
//!
//! Channel slices are stored in a fixed-size array. Building a `Buffer` and
//! every accessor on it are allocation-free.

use crate::types::MAX_CHANNELS;

/// Planar in-place buffer for one processing block.
pub struct Buffer<'a> {
    /// `Option<&mut [f32]>` is not `Copy`, so the array is built with `from_fn`.
    channels: [Option<&'a mut [f32]>; MAX_CHANNELS],
    num_channels: usize,
    num_input_channels: usize,
    num_samples: usize,
}

impl<'a> Buffer<'a> {
    /// Wrap host channel slices.
    ///
    /// Channels beyond [`MAX_CHANNELS`] are ignored. `num_samples` is clamped
    /// to the shortest slice and `num_input_channels` to the channel count.
    pub fn new(
        channels: impl IntoIterator<Item = &'a mut [f32]>,
        num_input_channels: usize,
        num_samples: usize,
    ) -> Self {
        let mut slots: [Option<&'a mut [f32]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_channels = 0;
        let mut num_samples = num_samples;
        for (slot, channel) in slots.iter_mut().zip(channels) {
            num_samples = num_samples.min(channel.len());
            *slot = Some(channel);
            num_channels += 1;
        }

        Self {
            channels: slots,
            num_channels,
            num_input_channels: num_input_channels.min(num_channels),
            num_samples,
        }
    }

    /// Number of samples in this block.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Total number of channels (inputs plus output-only channels).
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of channels that carry input audio.
    #[inline]
    pub fn num_input_channels(&self) -> usize {
        self.num_input_channels
    }

    /// Read a channel. Returns an empty slice if it doesn't exist.
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        let n = self.num_samples;
        self.channels
            .get(index)
            .and_then(|slot| slot.as_deref())
            .map(|ch| &ch[..n])
            .unwrap_or(&[])
    }

    /// Mutable access to a channel, or `None` if it doesn't exist.
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        let n = self.num_samples;
        self.channels
            .get_mut(index)
            .and_then(|slot| slot.as_deref_mut())
            .map(|ch| &mut ch[..n])
    }

    /// Iterate over all channels mutably.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + use<'_, 'a> {
        let n = self.num_samples;
        self.channels[..self.num_channels]
            .iter_mut()
            .filter_map(move |slot| slot.as_deref_mut().map(|ch| &mut ch[..n]))
    }

    /// Zero a channel.
    #[inline]
    pub fn clear_channel(&mut self, index: usize) {
        if let Some(channel) = self.channel_mut(index) {
            channel.fill(0.0);
        }
    }

    /// Overwrite channel `dst` with the contents of channel `src`.
    pub fn copy_channel(&mut self, src: usize, dst: usize) {
        if src == dst || src >= self.num_channels || dst >= self.num_channels {
            return;
        }
        let n = self.num_samples;
        let (low, high) = self.channels.split_at_mut(src.max(dst));
        let (src_slot, dst_slot) = if src < dst {
            (&low[src], &mut high[0])
        } else {
            (&high[0], &mut low[dst])
        };
        if let (Some(from), Some(to)) = (src_slot.as_deref(), dst_slot.as_deref_mut()) {
            to[..n].copy_from_slice(&from[..n]);
        }
    }

    /// Mutable access to channels 0 and 1 at once.
    pub fn stereo_mut(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        let n = self.num_samples;
        let (left, right) = self.channels.split_at_mut(1);
        match (left[0].as_deref_mut(), right[0].as_deref_mut()) {
            (Some(l), Some(r)) => Some((&mut l[..n], &mut r[..n])),
            _ => None,
        }
    }
}
