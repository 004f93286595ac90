// Pattern - Fixed note sequences and the drum grid of the loop
// Patterns are compile-time constants; playback order is slice order

use crate::sequencer::pitch::NoteSymbol;
use crate::sequencer::timeline::TimeSignature;

/// One step of a pattern: a note (or rest) held for a number of beats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternEntry {
    pub symbol: NoteSymbol,
    /// Duration in beats, always > 0
    pub beats: f64,
}

impl PatternEntry {
    pub const fn new(symbol: NoteSymbol, beats: f64) -> Self {
        Self { symbol, beats }
    }

    /// Frequency of the entry (0 for rests)
    pub fn frequency(&self) -> f32 {
        self.symbol.frequency()
    }
}

const fn note(symbol: NoteSymbol, beats: f64) -> PatternEntry {
    PatternEntry::new(symbol, beats)
}

use NoteSymbol::*;

/// Lead hook, 15 beats
pub const MELODY: Pattern = Pattern::new(
    "melody",
    &[
        note(C5, 0.5),
        note(C5, 0.5),
        note(C5, 0.5),
        note(Rest, 0.5),
        note(Bb4, 0.5),
        note(C5, 0.5),
        note(Rest, 0.25),
        note(C5, 0.25),
        note(Bb4, 0.5),
        note(G4, 1.0),
        note(Rest, 0.5),
        note(C5, 0.5),
        note(C5, 0.5),
        note(C5, 0.5),
        note(Rest, 0.5),
        note(Bb4, 0.5),
        note(C5, 0.5),
        note(Rest, 0.25),
        note(D5, 0.25),
        note(C5, 0.5),
        note(A4, 1.0),
        note(Rest, 0.5),
        note(C5, 0.5),
        note(Bb4, 0.5),
        note(G4, 0.5),
        note(F4, 0.5),
        note(E4, 0.5),
        note(G4, 0.25),
        note(A4, 0.25),
        note(C5, 1.0),
    ],
);

/// Bass line, 9 beats
pub const BASS: Pattern = Pattern::new(
    "bass",
    &[
        note(C3, 1.0),
        note(F3, 1.0),
        note(G3, 1.0),
        note(F3, 1.0),
        note(C3, 1.0),
        note(F3, 1.0),
        note(Bb3, 0.5),
        note(C3, 0.5),
        note(G3, 1.0),
    ],
);

/// An ordered, immutable sequence of pattern entries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pattern {
    pub name: &'static str,
    entries: &'static [PatternEntry],
}

impl Pattern {
    pub const fn new(name: &'static str, entries: &'static [PatternEntry]) -> Self {
        Self { name, entries }
    }

    /// Entries in playback order
    pub fn entries(&self) -> &'static [PatternEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry durations, rests included
    pub fn total_beats(&self) -> f64 {
        self.entries.iter().map(|entry| entry.beats).sum()
    }

    /// Entries paired with their beat offset from the start of the pattern
    pub fn offsets(&self) -> impl Iterator<Item = (f64, PatternEntry)> + '_ {
        self.entries.iter().scan(0.0, |cursor, entry| {
            let start = *cursor;
            *cursor += entry.beats;
            Some((start, *entry))
        })
    }
}

/// Percussion voices of the drum machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drum {
    Kick,
    Snare,
    Hat,
}

/// A drum hit at a beat offset from the loop start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumHit {
    pub drum: Drum,
    pub beat: f64,
}

/// Fixed-meter drum pattern: kick on 1 and 3, snare on 2 and 4, hat on every eighth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumGrid {
    pub bars: u32,
    pub time_signature: TimeSignature,
}

impl DrumGrid {
    /// Zero-based beats within a bar carrying a kick
    pub const KICK_BEATS: [f64; 2] = [0.0, 2.0];
    /// Zero-based beats within a bar carrying a snare
    pub const SNARE_BEATS: [f64; 2] = [1.0, 3.0];
    /// Hat subdivisions per beat (eighth notes)
    pub const HATS_PER_BEAT: u32 = 2;

    pub fn new(bars: u32, time_signature: TimeSignature) -> Self {
        assert!(bars > 0, "Drum grid must span at least 1 bar");
        Self {
            bars,
            time_signature,
        }
    }

    /// Beats covered by the whole grid
    pub fn total_beats(&self) -> f64 {
        self.bars as f64 * self.time_signature.beats_per_bar()
    }

    /// Every hit of the grid, bar by bar (accents past a short bar are skipped)
    pub fn hits(&self) -> impl Iterator<Item = DrumHit> + '_ {
        let beats_per_bar = self.time_signature.beats_per_bar();
        let hats_per_bar = (beats_per_bar as u32) * Self::HATS_PER_BEAT;

        (0..self.bars).flat_map(move |bar| {
            let bar_start = bar as f64 * beats_per_bar;
            let in_bar = move |beat: &&f64| **beat < beats_per_bar;
            let kicks = Self::KICK_BEATS.iter().filter(in_bar).map(move |beat| DrumHit {
                drum: Drum::Kick,
                beat: bar_start + beat,
            });
            let snares = Self::SNARE_BEATS.iter().filter(in_bar).map(move |beat| DrumHit {
                drum: Drum::Snare,
                beat: bar_start + beat,
            });
            let hats = (0..hats_per_bar).map(move |step| DrumHit {
                drum: Drum::Hat,
                beat: bar_start + step as f64 / Self::HATS_PER_BEAT as f64,
            });
            kicks.chain(snares).chain(hats)
        })
    }
}

impl Default for DrumGrid {
    /// The loop's 8-bar 4/4 grid
    fn default() -> Self {
        Self::new(8, TimeSignature::four_four())
    }
}
