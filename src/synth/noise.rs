// Noise - White noise burst of fixed length
//
// Behaves like a one-shot noise buffer: uniform samples in [-1, 1) for
// `length` samples, then silence. Samples are generated on the fly so the
// audio thread never allocates a buffer.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub struct NoiseBurst {
    rng: SmallRng,
    remaining: usize,
}

impl NoiseBurst {
    /// Burst of `seconds` of noise at `sample_rate`
    pub fn new(seconds: f64, sample_rate: f32, seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            remaining: (seconds * sample_rate as f64) as usize,
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }
        self.remaining -= 1;
        self.rng.r#gen::<f32>() * 2.0 - 1.0
    }

    /// True once every sample of the burst has been played
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}
