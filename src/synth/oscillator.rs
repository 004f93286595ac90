// Oscillateurs - Générateurs de formes d'onde

use std::f32::consts::PI;

pub trait Oscillator {
    fn next_sample(&mut self) -> f32;
    fn set_frequency(&mut self, freq: f32);
    fn reset(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformType {
    Sine,
    Square,
    Saw,
}

/// Frequency ratio for a detune in cents
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2_f32.powf(cents / 1200.0)
}

pub struct SimpleOscillator {
    waveform: WaveformType,
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
    detune_ratio: f32,
}

impl SimpleOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
            detune_ratio: 1.0,
        }
    }

    /// Detune applied on top of every frequency set afterwards
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_ratio = cents_to_ratio(cents);
        self
    }
}

impl Oscillator for SimpleOscillator {
    fn next_sample(&mut self) -> f32 {
        let sample = match self.waveform {
            WaveformType::Sine => (self.phase * 2.0 * PI).sin(),
            WaveformType::Square => {
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
            WaveformType::Saw => (self.phase * 2.0) - 1.0,
        };

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    fn set_frequency(&mut self, freq: f32) {
        // Negative or NaN frequencies would walk the phase out of [0, 1)
        let freq = if freq.is_finite() { freq.max(0.0) } else { 0.0 };
        self.phase_increment = freq * self.detune_ratio / self.sample_rate;
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const EPSILON: f32 = 0.001;

    #[test]
    fn test_oscillator_frequency() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);

        let expected_increment = 440.0 / SAMPLE_RATE;
        assert!((osc.phase_increment - expected_increment).abs() < EPSILON);
    }

    #[test]
    fn test_detune() {
        // +1200 cents = one octave up
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE).with_detune(1200.0);
        osc.set_frequency(440.0);
        assert!((osc.phase_increment - 880.0 / SAMPLE_RATE).abs() < 1e-6);

        // +5 cents is a slight sharpening
        let ratio = cents_to_ratio(5.0);
        assert!(ratio > 1.0 && ratio < 1.01);
    }

    #[test]
    fn test_oscillator_reset() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);

        for _ in 0..100 {
            osc.next_sample();
        }
        assert!(osc.phase > 0.0);

        osc.reset();
        assert_eq!(osc.phase, 0.0);
    }

    #[test]
    fn test_sine_starts_at_zero() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);

        let first_sample = osc.next_sample();
        assert!(first_sample.abs() < EPSILON, "First sample: {}", first_sample);
    }

    #[test]
    fn test_square_wave() {
        let mut osc = SimpleOscillator::new(WaveformType::Square, SAMPLE_RATE);
        osc.set_frequency(523.25);

        for _ in 0..1000 {
            let sample = osc.next_sample();
            assert!(
                (sample - 1.0).abs() < EPSILON || (sample + 1.0).abs() < EPSILON,
                "Square wave sample not ±1.0: {}",
                sample
            );
        }
    }

    #[test]
    fn test_saw_wave_range() {
        let mut osc = SimpleOscillator::new(WaveformType::Saw, SAMPLE_RATE);
        osc.set_frequency(130.81);

        for _ in 0..1000 {
            let sample = osc.next_sample();
            assert!(
                (-1.0..=1.0).contains(&sample),
                "Saw wave sample out of range: {}",
                sample
            );
        }
    }

    #[test]
    fn test_phase_wrapping() {
        let mut osc = SimpleOscillator::new(WaveformType::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);

        for _ in 0..10000 {
            osc.next_sample();
            assert!(
                osc.phase >= 0.0 && osc.phase < 1.0,
                "Phase out of range: {}",
                osc.phase
            );
        }
    }

    #[test]
    fn test_invalid_frequency_is_silent_phase() {
        let mut osc = SimpleOscillator::new(WaveformType::Saw, SAMPLE_RATE);
        osc.set_frequency(f32::NAN);
        assert_eq!(osc.phase_increment, 0.0);
        osc.set_frequency(-10.0);
        assert_eq!(osc.phase_increment, 0.0);
    }
}
