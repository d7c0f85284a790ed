use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use std::sync::Arc;

/// Shared sample buffer filled by the capture callback
///
/// When full the oldest samples are dropped, so an overlong press keeps the
/// most recent audio.
pub struct CaptureBuffer {
    buffer: Arc<Mutex<HeapRb<f32>>>,
}

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(HeapRb::new(capacity.max(1)))),
        }
    }

    /// Sized for `seconds` of audio at `sample_rate`
    pub fn for_duration(sample_rate: u32, seconds: u32) -> Self {
        Self::new(sample_rate as usize * seconds as usize)
    }

    pub fn write(&self, samples: &[f32]) {
        let mut buffer = self.buffer.lock();
        for &sample in samples {
            if buffer.try_push(sample).is_err() {
                let _ = buffer.try_pop();
                let _ = buffer.try_push(sample);
            }
        }
    }

    /// Take every buffered sample, oldest first
    pub fn drain(&self) -> Vec<f32> {
        let mut buffer = self.buffer.lock();
        let mut samples = Vec::with_capacity(buffer.occupied_len());
        while let Some(sample) = buffer.try_pop() {
            samples.push(sample);
        }
        samples
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity().get()
    }
}

impl Clone for CaptureBuffer {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_drain() {
        let buffer = CaptureBuffer::new(8);
        buffer.write(&[0.1, 0.2, 0.3]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.drain(), vec![0.1, 0.2, 0.3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_keeps_newest() {
        let buffer = CaptureBuffer::new(3);
        buffer.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buffer.drain(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_clones_share_storage() {
        let buffer = CaptureBuffer::for_duration(4, 2);
        assert_eq!(buffer.capacity(), 8);
        let writer = buffer.clone();
        writer.write(&[0.5]);
        assert_eq!(buffer.len(), 1);
        buffer.clear();
        assert!(writer.is_empty());
    }
}
