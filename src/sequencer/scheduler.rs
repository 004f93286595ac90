// Loop scheduler - Lays one pass of the loop onto an absolute timeline
//
// Each call walks the melody, the bass and the drum grid from the same start
// time and hands every note to the synthesizer. Nothing is retained between
// calls; the caller owns the running `next_loop_start`.

use crate::sequencer::pattern::{BASS, DrumGrid, MELODY, Pattern};
use crate::sequencer::timeline::Tempo;
use crate::synth::{Timbre, VoiceSink, emit, emit_drum};

/// Fraction of each melody slot the lead sounds for
pub const LEAD_TRIM: f64 = 0.92;
/// Fraction of each melody slot the harmony layer sounds for
pub const HARMONY_TRIM: f64 = 0.88;
/// Fraction of each bass slot the bass sounds for
pub const BASS_TRIM: f64 = 0.9;
/// Harmony plays a fifth above the lead
pub const HARMONY_RATIO: f32 = 1.5;
pub const HARMONY_DETUNE_CENTS: f32 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct LoopScheduler {
    tempo: Tempo,
    melody: Pattern,
    bass: Pattern,
    drums: DrumGrid,
}

impl LoopScheduler {
    pub fn new(tempo: Tempo, melody: Pattern, bass: Pattern, drums: DrumGrid) -> Self {
        Self {
            tempo,
            melody,
            bass,
            drums,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Length of one loop: the melody's beats at the loop tempo
    pub fn loop_duration(&self) -> f64 {
        self.tempo.beats_to_seconds(self.melody.total_beats())
    }

    /// Schedule one complete loop starting at `loop_start`
    ///
    /// Returns the time right after the last melody entry. Bass and drums are
    /// laid from the same start and may run past that point.
    pub fn schedule_loop<S: VoiceSink + ?Sized>(&self, sink: &mut S, loop_start: f64) -> f64 {
        let spb = self.tempo.beat_duration_seconds();

        for (beat, entry) in self.melody.offsets() {
            let start = loop_start + beat * spb;
            let slot = entry.beats * spb;
            let frequency = entry.frequency();

            emit(sink, frequency, start, slot * LEAD_TRIM, Timbre::Lead, 0.0);
            if !entry.symbol.is_rest() {
                emit(
                    sink,
                    frequency * HARMONY_RATIO,
                    start,
                    slot * HARMONY_TRIM,
                    Timbre::Harmony,
                    HARMONY_DETUNE_CENTS,
                );
            }
        }
        let loop_end = loop_start + self.melody.total_beats() * spb;

        for (beat, entry) in self.bass.offsets() {
            emit(
                sink,
                entry.frequency(),
                loop_start + beat * spb,
                entry.beats * spb * BASS_TRIM,
                Timbre::Bass,
                0.0,
            );
        }

        for hit in self.drums.hits() {
            emit_drum(sink, hit.drum, loop_start + hit.beat * spb);
        }

        tracing::trace!(loop_start, loop_end, "Loop scheduled");
        loop_end
    }
}

impl Default for LoopScheduler {
    fn default() -> Self {
        Self::new(Tempo::default(), MELODY, BASS, DrumGrid::default())
    }
}
