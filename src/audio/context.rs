// Audio context - What the playback controller needs from an audio output
//
// The controller only pushes future-timestamped work into a context; it never
// asks the context what it is currently playing.

use super::AudioResult;
use crate::synth::{ScheduledVoice, VoiceSink};
use std::fmt;

/// Identifier of a master gain bus inside a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId(pub u32);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus#{}", self.0)
    }
}

/// An audio output timeline voices can be scheduled on
pub trait AudioContext {
    /// Start (or restart) the output; a suspended context keeps its queue
    fn resume(&mut self) -> AudioResult<()>;

    /// Audio clock time in seconds
    fn current_time(&self) -> f64;

    /// Create a fresh master gain bus connected to the destination
    fn create_master(&mut self, gain: f32) -> BusId;

    /// Hold the bus at its value at `start`, then ramp exponentially to
    /// `target` at `end`
    fn ramp_master(&mut self, bus: BusId, target: f32, start: f64, end: f64);

    /// Hand a voice over to the context, routed through `bus`
    ///
    /// The voice may be held back until its start is close enough.
    fn schedule(&mut self, bus: BusId, voice: ScheduledVoice);

    /// Forward held-back voices that are now due; returns how many moved
    fn forward_due(&mut self) -> usize;
}

/// A master bus seen as a voice sink
pub struct OutputBus<'a, C: AudioContext + ?Sized> {
    context: &'a mut C,
    bus: BusId,
}

impl<'a, C: AudioContext + ?Sized> OutputBus<'a, C> {
    pub fn new(context: &'a mut C, bus: BusId) -> Self {
        Self { context, bus }
    }
}

impl<C: AudioContext + ?Sized> VoiceSink for OutputBus<'_, C> {
    fn push(&mut self, voice: ScheduledVoice) {
        self.context.schedule(self.bus, voice);
    }
}
