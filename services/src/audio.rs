//! Microphone audio chunking for streaming recognition.
//!
//! Capture callbacks hand over samples in whatever block size the device
//! uses. [`AudioChunker`] keeps them in a fixed-capacity ring and hands out
//! windows of exactly `window_size` samples, in capture order, ready to be
//! sent as `audio/l16` frames.

use bytes::{BufMut, Bytes, BytesMut};
use cogsdk_rest::{Error, Result};

/// Fixed-capacity ring of 16-bit samples cut into equal windows.
#[derive(Debug, Clone)]
pub struct AudioChunker {
    ring: Vec<i16>,
    head: usize,
    len: usize,
    window_size: usize,
    dropped: u64,
}

impl AudioChunker {
    /// Creates a chunker holding up to `capacity` samples.
    pub fn new(capacity: usize, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::invalid_argument("window_size", "must be positive"));
        }
        if capacity < window_size {
            return Err(Error::invalid_argument(
                "capacity",
                format!("must hold at least one window of {} samples", window_size),
            ));
        }
        Ok(Self {
            ring: vec![0; capacity],
            head: 0,
            len: 0,
            window_size,
            dropped: 0,
        })
    }

    /// Creates a chunker for `window` of audio at `sample_rate`, buffering
    /// up to `buffered` windows.
    pub fn for_duration(sample_rate: u32, window: std::time::Duration, buffered: usize) -> Result<Self> {
        let window_size = (sample_rate as u128 * window.as_millis() / 1000) as usize;
        Self::new(window_size.saturating_mul(buffered.max(1)), window_size)
    }

    pub fn capacity(&self) -> usize {
        self.ring.len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of samples overwritten before they were read.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Appends captured samples. When the ring is full the oldest samples
    /// are overwritten.
    pub fn push(&mut self, samples: &[i16]) {
        let cap = self.ring.len();
        for &s in samples {
            if self.len == cap {
                self.head = (self.head + 1) % cap;
                self.len -= 1;
                self.dropped += 1;
            }
            let tail = (self.head + self.len) % cap;
            self.ring[tail] = s;
            self.len += 1;
        }
    }

    /// Appends float samples in `[-1.0, 1.0]`, clamping anything outside.
    pub fn push_f32(&mut self, samples: &[f32]) {
        let converted: Vec<i16> = samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect();
        self.push(&converted);
    }

    /// Removes and returns the next full window, or `None` if fewer than
    /// `window_size` samples are buffered.
    pub fn next_window(&mut self) -> Option<Vec<i16>> {
        if self.len < self.window_size {
            return None;
        }
        Some(self.take(self.window_size))
    }

    /// Removes and returns whatever is left, possibly less than a window.
    pub fn flush(&mut self) -> Option<Vec<i16>> {
        if self.len == 0 {
            return None;
        }
        Some(self.take(self.len))
    }

    fn take(&mut self, n: usize) -> Vec<i16> {
        let cap = self.ring.len();
        let out = (0..n).map(|i| self.ring[(self.head + i) % cap]).collect();
        self.head = (self.head + n) % cap;
        self.len -= n;
        out
    }

    /// Encodes samples as little-endian 16-bit PCM.
    pub fn to_l16(samples: &[i16]) -> Bytes {
        let mut buf = BytesMut::with_capacity(samples.len() * 2);
        for &s in samples {
            buf.put_i16_le(s);
        }
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_in_order() {
        let mut c = AudioChunker::new(8, 3).unwrap();
        c.push(&[1, 2]);
        assert_eq!(c.next_window(), None);
        c.push(&[3, 4, 5, 6, 7]);
        assert_eq!(c.next_window(), Some(vec![1, 2, 3]));
        assert_eq!(c.next_window(), Some(vec![4, 5, 6]));
        assert_eq!(c.next_window(), None);
        assert_eq!(c.flush(), Some(vec![7]));
        assert_eq!(c.flush(), None);
        assert!(c.is_empty());
    }

    #[test]
    fn test_wraps_around() {
        let mut c = AudioChunker::new(4, 2).unwrap();
        for round in 0..5i16 {
            c.push(&[round * 10, round * 10 + 1, round * 10 + 2]);
            assert_eq!(c.next_window(), Some(vec![round * 10, round * 10 + 1]));
            assert_eq!(c.flush(), Some(vec![round * 10 + 2]));
        }
        assert_eq!(c.dropped(), 0);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut c = AudioChunker::new(4, 2).unwrap();
        c.push(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(c.dropped(), 2);
        assert_eq!(c.len(), 4);
        assert_eq!(c.next_window(), Some(vec![3, 4]));
        assert_eq!(c.next_window(), Some(vec![5, 6]));
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(AudioChunker::new(4, 0).is_err());
        assert!(AudioChunker::new(2, 4).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_for_duration() {
        let c = AudioChunker::for_duration(16000, std::time::Duration::from_millis(100), 10).unwrap();
        assert_eq!(c.window_size(), 1600);
        assert_eq!(c.capacity(), 16000);
    }

    #[test]
    fn test_push_f32_clamps() {
        let mut c = AudioChunker::new(4, 4).unwrap();
        c.push_f32(&[0.0, 1.0, -1.0, 2.0]);
        assert_eq!(c.next_window(), Some(vec![0, i16::MAX, -i16::MAX, i16::MAX]));
    }

    #[test]
    fn test_to_l16() {
        let pcm = AudioChunker::to_l16(&[1, -2, 0x1234]);
        assert_eq!(pcm.as_ref(), &[0x01, 0x00, 0xfe, 0xff, 0x34, 0x12]);
    }
}
