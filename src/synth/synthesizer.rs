// Synthesizer - Turns note requests into scheduled voices
//
// `emit` builds one generator plus one gain envelope per call and pushes the
// result into a sink. Nothing is retained after the push.

use super::envelope::{Automation, ENVELOPE_FLOOR, EnvelopeShape};
use super::oscillator::WaveformType;
use super::voice::{ScheduledVoice, Source};
use crate::sequencer::pattern::Drum;

/// Start pitch of the kick's downward sweep
pub const KICK_START_HZ: f32 = 150.0;
/// Kick sweep and envelope length
pub const KICK_LENGTH: f64 = 0.4;
/// Snare noise buffer length
pub const SNARE_LENGTH: f64 = 0.15;
/// Hat noise buffer length
pub const HAT_LENGTH: f64 = 0.05;
/// Hat high-pass cutoff
pub const HAT_CUTOFF_HZ: f32 = 7000.0;
/// Noise voices only need a non-zero frequency to sound
pub const NOISE_GATE_HZ: f32 = 1.0;

/// Receiver of scheduled voices (an output bus, or a plain Vec in tests)
pub trait VoiceSink {
    fn push(&mut self, voice: ScheduledVoice);
}

impl VoiceSink for Vec<ScheduledVoice> {
    fn push(&mut self, voice: ScheduledVoice) {
        Vec::push(self, voice);
    }
}

/// Timbral role of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timbre {
    /// Square lead
    Lead,
    /// Sine layer a fifth above the lead
    Harmony,
    /// Sawtooth bass
    Bass,
    /// Sine with a fast pitch drop
    Kick,
    /// Short white-noise burst
    Snare,
    /// Very short high-passed noise burst
    Hat,
}

impl Timbre {
    pub fn is_percussive(self) -> bool {
        matches!(self, Timbre::Kick | Timbre::Snare | Timbre::Hat)
    }

    /// Fixed decay window of percussive timbres
    fn window(self) -> Option<f64> {
        match self {
            Timbre::Kick => Some(KICK_LENGTH),
            Timbre::Snare => Some(SNARE_LENGTH),
            Timbre::Hat => Some(HAT_LENGTH),
            Timbre::Lead | Timbre::Harmony | Timbre::Bass => None,
        }
    }

    /// Gain envelope for a note of `duration` seconds
    fn envelope(self, duration: f64) -> EnvelopeShape {
        let (peak, attack, release_at) = match self {
            Timbre::Lead | Timbre::Harmony => (0.5, 0.01, duration * 0.9),
            Timbre::Bass => (0.28, 0.02, duration * 0.85),
            Timbre::Kick => (0.8, 0.005, KICK_LENGTH.min(duration)),
            Timbre::Snare => (0.35, 0.005, 0.12_f64.min(duration)),
            Timbre::Hat => (0.18, 0.002, 0.04_f64.min(duration)),
        };
        EnvelopeShape::new(peak, attack, release_at.max(attack * 2.0))
    }

    fn source(self, frequency: f32, start: f64, detune_cents: f32) -> Source {
        match self {
            Timbre::Lead => Source::Tone {
                waveform: WaveformType::Square,
                frequency: Automation::new(frequency),
                detune_cents,
            },
            Timbre::Harmony => Source::Tone {
                waveform: WaveformType::Sine,
                frequency: Automation::new(frequency),
                detune_cents,
            },
            Timbre::Bass => Source::Tone {
                waveform: WaveformType::Saw,
                frequency: Automation::new(frequency),
                detune_cents,
            },
            Timbre::Kick => {
                let mut sweep = Automation::new(frequency);
                sweep
                    .set_value_at(frequency, start)
                    .exponential_ramp_to(ENVELOPE_FLOOR, start + KICK_LENGTH);
                Source::Tone {
                    waveform: WaveformType::Sine,
                    frequency: sweep,
                    detune_cents,
                }
            }
            Timbre::Snare => Source::Noise {
                length: SNARE_LENGTH,
                highpass: None,
            },
            Timbre::Hat => Source::Noise {
                length: HAT_LENGTH,
                highpass: Some(frequency),
            },
        }
    }
}

/// Schedule one voice
///
/// A zero frequency is a rest: nothing is created. Percussive timbres stop
/// after their own decay window when it is shorter than `duration`; the hat
/// uses `frequency` as its high-pass cutoff and the snare ignores it.
/// Returns whether a voice was pushed.
pub fn emit<S: VoiceSink + ?Sized>(
    sink: &mut S,
    frequency: f32,
    start: f64,
    duration: f64,
    timbre: Timbre,
    detune_cents: f32,
) -> bool {
    if frequency == 0.0 || !frequency.is_finite() {
        return false;
    }
    if !(duration > 0.0 && duration.is_finite()) {
        return false;
    }

    let shape = timbre.envelope(duration);
    let length = timbre.window().map_or(duration, |window| window.min(duration));
    let stop = start + length.max(shape.release_at);

    sink.push(ScheduledVoice {
        timbre,
        source: timbre.source(frequency, start, detune_cents),
        gain: shape.automation(start),
        start,
        stop,
    });
    true
}

/// Schedule one drum hit at `time`
pub fn emit_drum<S: VoiceSink + ?Sized>(sink: &mut S, drum: Drum, time: f64) -> bool {
    let (timbre, frequency, length) = match drum {
        Drum::Kick => (Timbre::Kick, KICK_START_HZ, KICK_LENGTH),
        Drum::Snare => (Timbre::Snare, NOISE_GATE_HZ, SNARE_LENGTH),
        Drum::Hat => (Timbre::Hat, HAT_CUTOFF_HZ, HAT_LENGTH),
    };
    emit(sink, frequency, time, length, timbre, 0.0)
}
