// Space Jam loop - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod messaging;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::{AudioContext, AudioError, CpalContext, Mixer, OfflineContext, WavExporter};
pub use config::{ConfigError, PlaybackConfig};
pub use messaging::channels::{create_command_channel, create_notification_channel};
pub use sequencer::{
    ControlState, LoopScheduler, PlaybackController, PlaybackStatus, Tempo, ToggleControl,
};
pub use synth::{ScheduledVoice, Timbre, VoiceSink, emit, emit_drum};
