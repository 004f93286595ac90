// Pitch table - note names to frequencies
// The rest symbol maps to 0 Hz, which the synthesizer treats as silence

use std::fmt;

/// Frequency used for silence
pub const SILENCE_HZ: f32 = 0.0;

/// A note name from the loop's pitch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSymbol {
    C3,
    D3,
    F3,
    G3,
    A3,
    Bb3,
    C4,
    D4,
    E4,
    F4,
    G4,
    A4,
    Bb4,
    B4,
    C5,
    D5,
    E5,
    F5,
    G5,
    A5,
    Bb5,
    B5,
    Rest,
}

impl NoteSymbol {
    /// Every symbol in the table, rest included
    pub const ALL: [NoteSymbol; 23] = [
        NoteSymbol::C3,
        NoteSymbol::D3,
        NoteSymbol::F3,
        NoteSymbol::G3,
        NoteSymbol::A3,
        NoteSymbol::Bb3,
        NoteSymbol::C4,
        NoteSymbol::D4,
        NoteSymbol::E4,
        NoteSymbol::F4,
        NoteSymbol::G4,
        NoteSymbol::A4,
        NoteSymbol::Bb4,
        NoteSymbol::B4,
        NoteSymbol::C5,
        NoteSymbol::D5,
        NoteSymbol::E5,
        NoteSymbol::F5,
        NoteSymbol::G5,
        NoteSymbol::A5,
        NoteSymbol::Bb5,
        NoteSymbol::B5,
        NoteSymbol::Rest,
    ];

    /// Frequency in Hz (0 for the rest)
    pub fn frequency(self) -> f32 {
        match self {
            NoteSymbol::C3 => 130.81,
            NoteSymbol::D3 => 146.83,
            NoteSymbol::F3 => 174.61,
            NoteSymbol::G3 => 196.00,
            NoteSymbol::A3 => 220.00,
            NoteSymbol::Bb3 => 233.08,
            NoteSymbol::C4 => 261.63,
            NoteSymbol::D4 => 293.66,
            NoteSymbol::E4 => 329.63,
            NoteSymbol::F4 => 349.23,
            NoteSymbol::G4 => 392.00,
            NoteSymbol::A4 => 440.00,
            NoteSymbol::Bb4 => 466.16,
            NoteSymbol::B4 => 493.88,
            NoteSymbol::C5 => 523.25,
            NoteSymbol::D5 => 587.33,
            NoteSymbol::E5 => 659.25,
            NoteSymbol::F5 => 698.46,
            NoteSymbol::G5 => 783.99,
            NoteSymbol::A5 => 880.00,
            NoteSymbol::Bb5 => 932.33,
            NoteSymbol::B5 => 987.77,
            NoteSymbol::Rest => SILENCE_HZ,
        }
    }

    /// Note name as written in the table ("_" for the rest)
    pub fn name(self) -> &'static str {
        match self {
            NoteSymbol::C3 => "C3",
            NoteSymbol::D3 => "D3",
            NoteSymbol::F3 => "F3",
            NoteSymbol::G3 => "G3",
            NoteSymbol::A3 => "A3",
            NoteSymbol::Bb3 => "Bb3",
            NoteSymbol::C4 => "C4",
            NoteSymbol::D4 => "D4",
            NoteSymbol::E4 => "E4",
            NoteSymbol::F4 => "F4",
            NoteSymbol::G4 => "G4",
            NoteSymbol::A4 => "A4",
            NoteSymbol::Bb4 => "Bb4",
            NoteSymbol::B4 => "B4",
            NoteSymbol::C5 => "C5",
            NoteSymbol::D5 => "D5",
            NoteSymbol::E5 => "E5",
            NoteSymbol::F5 => "F5",
            NoteSymbol::G5 => "G5",
            NoteSymbol::A5 => "A5",
            NoteSymbol::Bb5 => "Bb5",
            NoteSymbol::B5 => "B5",
            NoteSymbol::Rest => "_",
        }
    }

    /// Look up a symbol by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|symbol| symbol.name() == name)
    }

    pub fn is_rest(self) -> bool {
        self.frequency() == SILENCE_HZ
    }
}

impl fmt::Display for NoteSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Frequency for a note name
///
/// Names missing from the table resolve to silence instead of failing, so a
/// misspelled note behaves exactly like a rest.
pub fn frequency_of(name: &str) -> f32 {
    NoteSymbol::from_name(name)
        .map(NoteSymbol::frequency)
        .unwrap_or(SILENCE_HZ)
}
