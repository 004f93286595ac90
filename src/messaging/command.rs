// Types de commandes - Communication contrôle → Audio

use crate::audio::BusId;
use crate::synth::ScheduledVoice;

#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Connect a new master gain bus to the output
    CreateBus { bus: BusId, gain: f32 },
    /// Queue a voice on a bus
    Schedule { bus: BusId, voice: ScheduledVoice },
    /// Hold the bus gain at its value at `start`, ramp to `target` by `end`
    RampBus {
        bus: BusId,
        target: f32,
        start: f64,
        end: f64,
    },
}
