// Voice staging - Control-side queue of voices not yet due
//
// The re-arm cadence keeps scheduling loops further ahead than the audio side
// needs. Voices wait here, ordered by start time, and are forwarded to the
// mixer only once their start enters the forward window, so the mixer's
// pre-allocated queues never have to grow.

use crate::audio::BusId;
use crate::synth::ScheduledVoice;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// How far ahead of the audio clock voices are handed to the mixer (seconds)
pub const FORWARD_WINDOW: f64 = 2.0;

struct StagedVoice {
    /// Insertion order, keeps equal start times FIFO
    sequence: u64,
    bus: BusId,
    voice: ScheduledVoice,
}

impl PartialEq for StagedVoice {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StagedVoice {}

impl PartialOrd for StagedVoice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StagedVoice {
    // Reversed: BinaryHeap is a max-heap, the earliest start must pop first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .voice
            .start
            .total_cmp(&self.voice.start)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Default)]
pub struct VoiceStaging {
    queue: BinaryHeap<StagedVoice>,
    next_sequence: u64,
}

impl VoiceStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bus: BusId, voice: ScheduledVoice) {
        self.next_sequence += 1;
        self.queue.push(StagedVoice {
            sequence: self.next_sequence,
            bus,
            voice,
        });
    }

    /// Pop the earliest voice if it starts before `until`
    pub fn pop_due(&mut self, until: f64) -> Option<(BusId, ScheduledVoice)> {
        if self.queue.peek()?.voice.start >= until {
            return None;
        }
        self.queue.pop().map(|staged| (staged.bus, staged.voice))
    }

    /// Drop the voices of `bus` starting at or after `from`
    ///
    /// Used when a bus fades out: nothing routed to it after the fade would
    /// be audible, and the mixer discards it anyway.
    pub fn discard_from(&mut self, bus: BusId, from: f64) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|staged| staged.bus != bus || staged.voice.start < from);
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
