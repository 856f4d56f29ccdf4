use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Append-only capture buffer with absolute-index addressing.
///
/// Samples keep their absolute position for the lifetime of a session even
/// after the front of the buffer has been discarded: index 0 is the first
/// sample ever appended, and `discard_before` only shifts the retained
/// window forward. The capture callback writes while the polling loop reads
/// and trims, so every operation goes through the one internal lock.
///
/// Out-of-range arguments are clamped, never rejected.
pub struct AudioRingBuffer {
    inner: Mutex<Inner>,
}

struct Inner {
    samples: VecDeque<f32>,
    /// Number of samples dropped off the front so far. Absolute index of
    /// `samples[0]` is exactly this value.
    discarded: u64,
}

impl AudioRingBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                samples: VecDeque::new(),
                discarded: 0,
            }),
        }
    }

    /// Append captured samples (f32 PCM in [-1.0, 1.0]).
    pub fn append(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.samples.extend(samples.iter().copied());
    }

    /// Total samples ever appended, independent of front truncation.
    pub fn total_appended(&self) -> u64 {
        let inner = self.inner.lock();
        inner.discarded + inner.samples.len() as u64
    }

    /// Samples currently retained.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().samples.is_empty()
    }

    /// Absolute index of the oldest retained sample.
    pub fn discarded(&self) -> u64 {
        self.inner.lock().discarded
    }

    /// Duration of retained audio at the given sample rate.
    pub fn buffered_duration(&self, sample_rate_hz: u32) -> Duration {
        let len = self.len() as f64;
        Duration::from_secs_f64(len / sample_rate_hz.max(1) as f64)
    }

    /// Copy out the samples in `[abs_from, abs_to)`, clamped to the retained
    /// range. Returns an empty vec when the clamped range is empty.
    pub fn read_range(&self, abs_from: u64, abs_to: u64) -> Vec<f32> {
        let inner = self.inner.lock();
        let start_abs = inner.discarded;
        let end_abs = inner.discarded + inner.samples.len() as u64;

        let from = abs_from.clamp(start_abs, end_abs);
        let to = abs_to.clamp(start_abs, end_abs);
        if to <= from {
            return Vec::new();
        }

        let skip = (from - start_abs) as usize;
        let take = (to - from) as usize;
        inner.samples.iter().skip(skip).take(take).copied().collect()
    }

    /// Drop every sample before `abs_index`, returning how many were
    /// removed. Indices at or past `abs_index` stay valid references.
    pub fn discard_before(&self, abs_index: u64) -> u64 {
        let mut inner = self.inner.lock();
        let start_abs = inner.discarded;
        let end_abs = inner.discarded + inner.samples.len() as u64;

        let cut = abs_index.clamp(start_abs, end_abs);
        let drop_count = cut - start_abs;
        if drop_count > 0 {
            inner.samples.drain(..drop_count as usize);
            inner.discarded = cut;
            tracing::trace!(
                target: "audio",
                "Discarded {} samples, front now at {}",
                drop_count,
                cut
            );
        }
        drop_count
    }

    /// Drop everything and reset absolute indexing to zero.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.samples.clear();
        inner.discarded = 0;
    }
}

impl Default for AudioRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_range_is_clamped() {
        let buf = AudioRingBuffer::new();
        buf.append(&[0.1, 0.2, 0.3]);
        assert_eq!(buf.read_range(0, 100), vec![0.1, 0.2, 0.3]);
        assert_eq!(buf.read_range(2, 1), Vec::<f32>::new());
        assert_eq!(buf.read_range(50, 100), Vec::<f32>::new());
    }

    #[test]
    fn discard_preserves_absolute_indices() {
        let buf = AudioRingBuffer::new();
        buf.append(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buf.discard_before(2), 2);
        assert_eq!(buf.read_range(2, 4), vec![3.0, 4.0]);
        // Already-dropped range reads back empty, not shifted data.
        assert_eq!(buf.read_range(0, 2), Vec::<f32>::new());
        assert_eq!(buf.total_appended(), 4);
    }

    #[test]
    fn discard_before_is_idempotent() {
        let buf = AudioRingBuffer::new();
        buf.append(&[1.0; 8]);
        assert_eq!(buf.discard_before(5), 5);
        assert_eq!(buf.discard_before(5), 0);
        assert_eq!(buf.discard_before(3), 0);
        assert_eq!(buf.len(), 3);
    }
}
