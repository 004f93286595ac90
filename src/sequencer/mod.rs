// Sequencer module
// Pitch and pattern data, loop scheduling, and the play/stop controller

pub mod controller;
pub mod pattern;
pub mod pitch;
pub mod scheduler;
pub mod timeline;
pub mod timer;

pub use controller::{
    ControlState, PLAY_LABEL, PlaybackController, PlaybackSession, PlaybackStatus, STOP_LABEL,
    ToggleControl,
};
pub use pattern::{BASS, Drum, DrumGrid, DrumHit, MELODY, Pattern, PatternEntry};
pub use pitch::{NoteSymbol, SILENCE_HZ, frequency_of};
pub use scheduler::LoopScheduler;
pub use timeline::{LOOP_BPM, Tempo, TimeSignature};
pub use timer::{CancelToken, HostClock, ManualClock, RepeatingTimer, SystemClock};
