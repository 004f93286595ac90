// Filter - High-pass State Variable Filter (Chamberlin)
//
// Digital implementation of a 2-pole State Variable Filter; only the
// high-pass output is used, to thin the hat noise.
//
// References:
// - Hal Chamberlin's "Musical Applications of Microprocessors" (1985)
// - https://www.earlevel.com/main/2003/03/02/the-digital-state-variable-filter/
//
// Characteristics:
// - 12dB/octave slope (2-pole)
// - Stable up to ~Fs/6 (8kHz @ 48kHz sample rate)

use std::f32::consts::PI;

/// Butterworth response
pub const DEFAULT_Q: f32 = 0.707;

/// Fixed-cutoff high-pass filter
pub struct HighPassFilter {
    cutoff: f32,
    sample_rate: f32,

    // State variables
    low: f32,
    band: f32,

    // Coefficients
    f: f32, // Frequency coefficient
    q: f32, // Damping (1/Q)
}

impl HighPassFilter {
    /// Create a filter at `cutoff` Hz
    ///
    /// Cutoff is clamped to [20 Hz, Fs/6] for numerical stability.
    pub fn new(cutoff: f32, sample_rate: f32) -> Self {
        let max_cutoff = sample_rate / 6.0;
        let safe_cutoff = cutoff.clamp(20.0, max_cutoff);

        Self {
            cutoff: safe_cutoff,
            sample_rate,
            low: 0.0,
            band: 0.0,
            // f = 2 * sin(π * fc / Fs)
            f: 2.0 * (PI * safe_cutoff / sample_rate).sin(),
            q: (1.0 / DEFAULT_Q).clamp(0.01, 2.0),
        }
    }

    /// Effective cutoff after clamping
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Clear the delay lines
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // hp = input - low - q*band
        let high = input - self.low - self.q * self.band;
        self.band += self.f * high;
        self.low += self.f * self.band;
        high
    }
}
