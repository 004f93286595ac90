// Audio clock - Shared sample counter of the output stream

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Position of the audio output, shared between the audio callback and the
/// control thread
#[derive(Clone)]
pub struct AudioClock {
    /// Frames rendered so far (written by the audio callback)
    sample_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Frames rendered so far
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Store the frame position (called from audio callback)
    pub fn set_position(&self, frames: u64) {
        self.sample_position.store(frames, Ordering::Relaxed);
    }

    /// Current time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_sample() as f64 / self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = AudioClock::new(48000.0);
        assert_eq!(clock.current_sample(), 0);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_clock_is_shared() {
        let clock = AudioClock::new(48000.0);
        let audio_side = clock.clone();

        audio_side.set_position(24000);
        assert_eq!(clock.current_sample(), 24000);
        assert_eq!(clock.current_time(), 0.5);
    }
}
