// Mixer - Audio-side owner of master buses and voices
//
// Consumes `Command`s, activates voices when their start time enters the
// block being rendered, and sums them through their bus gain. Voices are
// dropped once they pass their stop time; a bus whose fade-out ramp has
// ended is removed together with everything still routed to it.

use crate::audio::BusId;
use crate::audio::dsp_utils::{flush_denormals_to_zero, soft_clip};
use crate::messaging::Command;
use crate::synth::envelope::Automation;
use crate::synth::{ActiveVoice, ScheduledVoice};

/// Pre-allocated voice slots; voices are forwarded a few seconds ahead, so a
/// handful of overlapping loops fit
pub const VOICE_CAPACITY: usize = 2048;
/// Master bus slots: one live bus plus the ones still fading out
pub const BUS_CAPACITY: usize = 8;

struct MasterBus {
    id: BusId,
    gain: Automation,
    /// Gain at the sample being rendered
    current: f32,
    /// End of the fade-out ramp, once one was requested
    retire_after: Option<f64>,
}

pub struct Mixer {
    sample_rate: f32,
    position: u64,
    buses: [Option<MasterBus>; BUS_CAPACITY],
    pending: Vec<(BusId, ScheduledVoice)>,
    active: Vec<(BusId, ActiveVoice)>,
    next_seed: u64,
    /// Voices refused because the pending queue was full
    dropped: u64,
}

impl Mixer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            position: 0,
            buses: std::array::from_fn(|_| None),
            pending: Vec::with_capacity(VOICE_CAPACITY),
            active: Vec::with_capacity(VOICE_CAPACITY),
            next_seed: 0x5eed,
            dropped: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Time of the next frame to render, in seconds
    pub fn current_time(&self) -> f64 {
        self.time_of(self.position)
    }

    #[inline]
    fn time_of(&self, frame: u64) -> f64 {
        frame as f64 / self.sample_rate as f64
    }

    fn find_bus(&self, bus: BusId) -> Option<&MasterBus> {
        self.buses.iter().flatten().find(|b| b.id == bus)
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::CreateBus { bus, gain } => {
                let slot = self.free_bus_slot();
                self.buses[slot] = Some(MasterBus {
                    id: bus,
                    gain: Automation::new(gain),
                    current: gain,
                    retire_after: None,
                });
            }
            Command::Schedule { bus, voice } => {
                // Voices routed to a bus that no longer exists are dropped
                if self.find_bus(bus).is_none() {
                    return;
                }
                if self.pending.len() < VOICE_CAPACITY {
                    self.pending.push((bus, voice));
                } else {
                    self.dropped += 1;
                }
            }
            Command::RampBus {
                bus,
                target,
                start,
                end,
            } => {
                if let Some(master) = self.buses.iter_mut().flatten().find(|b| b.id == bus) {
                    let held = master.gain.value_at(start);
                    let mut gain = Automation::new(held);
                    gain.set_value_at(held, start)
                        .exponential_ramp_to(target, end.max(start));
                    master.gain = gain;
                    master.retire_after = Some(end.max(start));
                }
            }
        }
    }

    /// Index of a free bus slot, evicting one when all are taken
    ///
    /// Eviction prefers the bus closest to the end of its fade-out, then the
    /// oldest bus.
    fn free_bus_slot(&mut self) -> usize {
        if let Some(free) = self.buses.iter().position(Option::is_none) {
            return free;
        }

        let mut victim = 0;
        let mut best = (f64::INFINITY, u32::MAX);
        for (index, master) in self.buses.iter().enumerate() {
            if let Some(master) = master {
                let priority = (master.retire_after.unwrap_or(f64::INFINITY), master.id.0);
                if priority.0 < best.0 || (priority.0 == best.0 && priority.1 < best.1) {
                    best = priority;
                    victim = index;
                }
            }
        }
        self.remove_bus(victim);
        victim
    }

    fn remove_bus(&mut self, slot: usize) {
        if let Some(master) = self.buses[slot].take() {
            self.pending.retain(|(bus, _)| *bus != master.id);
            self.active.retain(|(bus, _)| *bus != master.id);
        }
    }

    /// Gain of `bus` at `time`, if the bus is still connected
    pub fn bus_gain(&self, bus: BusId, time: f64) -> Option<f32> {
        self.find_bus(bus).map(|b| b.gain.value_at(time))
    }

    pub fn bus_count(&self) -> usize {
        self.buses.iter().flatten().count()
    }

    /// Voices waiting for their start time
    pub fn pending_voices(&self) -> usize {
        self.pending.len()
    }

    /// Voices currently rendering
    pub fn active_voices(&self) -> usize {
        self.active.len()
    }

    /// Voices refused because the queue was full
    pub fn dropped_voices(&self) -> u64 {
        self.dropped
    }

    /// Render the next `out.len()` mono frames
    pub fn render(&mut self, out: &mut [f32]) {
        let block_end = self.time_of(self.position + out.len() as u64);
        self.activate_until(block_end);

        let sample_rate = self.sample_rate as f64;
        let Self {
            buses,
            active,
            position,
            ..
        } = self;

        for (offset, sample) in out.iter_mut().enumerate() {
            let time = (*position + offset as u64) as f64 / sample_rate;

            for master in buses.iter_mut().flatten() {
                master.current = master.gain.value_at(time);
            }

            let mut mix = 0.0;
            for (bus, voice) in active.iter_mut() {
                let gain = buses
                    .iter()
                    .flatten()
                    .find(|b| b.id == *bus)
                    .map_or(0.0, |b| b.current);
                mix += voice.render(time) * gain;
            }

            *sample = soft_clip(flush_denormals_to_zero(mix));
        }

        self.position += out.len() as u64;

        let now = self.current_time();
        self.active.retain(|(_, voice)| !voice.is_finished(now));
        self.retire_buses(now);
    }

    fn activate_until(&mut self, block_end: f64) {
        let mut index = 0;
        while index < self.pending.len() {
            // Full: the rest waits for a slot to free up
            if self.active.len() == VOICE_CAPACITY {
                break;
            }
            if self.pending[index].1.start < block_end {
                let (bus, voice) = self.pending.swap_remove(index);
                self.next_seed = self.next_seed.wrapping_add(1);
                self.active
                    .push((bus, ActiveVoice::new(&voice, self.sample_rate, self.next_seed)));
            } else {
                index += 1;
            }
        }
    }

    fn retire_buses(&mut self, now: f64) {
        for slot in 0..BUS_CAPACITY {
            let faded = self.buses[slot]
                .as_ref()
                .and_then(|master| master.retire_after)
                .is_some_and(|end| now >= end);
            if faded {
                self.remove_bus(slot);
            }
        }
    }
}
