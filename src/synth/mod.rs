// Module synthèse - Oscillateurs, bruit et enveloppes des voix

pub mod envelope;
pub mod filter;
pub mod noise;
pub mod oscillator;
pub mod synthesizer;
pub mod voice;

pub use synthesizer::{Timbre, VoiceSink, emit, emit_drum};
pub use voice::{ActiveVoice, ScheduledVoice, Source};
