// Voice - Un événement sonore programmé
//
// `ScheduledVoice` is the plain description produced on the control side;
// `ActiveVoice` is the rendering state the mixer builds from it on the audio
// side. Neither holds a reference back to whoever scheduled it.

use super::envelope::Automation;
use super::filter::HighPassFilter;
use super::noise::NoiseBurst;
use super::oscillator::{Oscillator, SimpleOscillator, WaveformType};
use super::synthesizer::Timbre;

/// Sound generator of a voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// Periodic oscillator, frequency automated over time
    Tone {
        waveform: WaveformType,
        frequency: Automation,
        detune_cents: f32,
    },
    /// White noise burst, optionally high-passed
    Noise {
        length: f64,
        highpass: Option<f32>,
    },
}

/// One fire-and-forget synthesis event with absolute times on the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledVoice {
    pub timbre: Timbre,
    pub source: Source,
    pub gain: Automation,
    pub start: f64,
    pub stop: f64,
}

impl ScheduledVoice {
    /// Oscillator frequency when the voice starts (None for noise)
    pub fn start_frequency(&self) -> Option<f32> {
        match &self.source {
            Source::Tone { frequency, .. } => Some(frequency.value_at(self.start)),
            Source::Noise { .. } => None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }
}

enum Generator {
    Tone {
        oscillator: SimpleOscillator,
        frequency: Automation,
    },
    Noise {
        burst: NoiseBurst,
        filter: Option<HighPassFilter>,
    },
}

/// Rendering state of a scheduled voice
pub struct ActiveVoice {
    gain: Automation,
    start: f64,
    stop: f64,
    generator: Generator,
}

impl ActiveVoice {
    pub fn new(voice: &ScheduledVoice, sample_rate: f32, seed: u64) -> Self {
        let generator = match voice.source {
            Source::Tone {
                waveform,
                frequency,
                detune_cents,
            } => {
                let mut oscillator =
                    SimpleOscillator::new(waveform, sample_rate).with_detune(detune_cents);
                oscillator.set_frequency(frequency.value_at(voice.start));
                Generator::Tone {
                    oscillator,
                    frequency,
                }
            }
            Source::Noise { length, highpass } => Generator::Noise {
                burst: NoiseBurst::new(length, sample_rate, seed),
                filter: highpass.map(|cutoff| HighPassFilter::new(cutoff, sample_rate)),
            },
        };

        Self {
            gain: voice.gain,
            start: voice.start,
            stop: voice.stop,
            generator,
        }
    }

    /// Sample at audio-clock `time` (silent outside [start, stop))
    #[inline]
    pub fn render(&mut self, time: f64) -> f32 {
        if time < self.start || time >= self.stop {
            return 0.0;
        }

        let raw = match &mut self.generator {
            Generator::Tone {
                oscillator,
                frequency,
            } => {
                if !frequency.breakpoints().is_empty() {
                    oscillator.set_frequency(frequency.value_at(time));
                }
                oscillator.next_sample()
            }
            Generator::Noise { burst, filter } => {
                let sample = burst.next_sample();
                match filter {
                    Some(filter) => filter.process(sample),
                    None => sample,
                }
            }
        };

        raw * self.gain.value_at(time)
    }

    /// True once the voice has reached its stop time
    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.stop
    }
}
