// Envelope - Breakpoint automation for gain and pitch
//
// A parameter timeline made of "set value at time" and "exponential ramp to
// value at time" events, evaluated against the audio clock.
// Exponential ramps never target 0: values are clamped to ENVELOPE_FLOOR.

/// Smallest value an exponential ramp may reach
pub const ENVELOPE_FLOOR: f32 = 0.001;

/// Maximum number of events on one automation timeline
pub const MAX_BREAKPOINTS: usize = 6;

/// How the value travels from the previous event to this one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// Jump to the value at the event time
    Step,
    /// Exponential interpolation from the previous value
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub time: f64,
    pub value: f32,
    pub curve: Curve,
}

/// Automation timeline for a single parameter
///
/// Events must be added in non-decreasing time order. `Copy` so a whole voice
/// description can travel through the command ring buffer without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Automation {
    default_value: f32,
    points: [Breakpoint; MAX_BREAKPOINTS],
    len: usize,
}

impl Automation {
    /// Create a timeline holding `default_value` until the first event
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            points: [Breakpoint {
                time: 0.0,
                value: 0.0,
                curve: Curve::Step,
            }; MAX_BREAKPOINTS],
            len: 0,
        }
    }

    /// Jump to `value` at `time`
    pub fn set_value_at(&mut self, value: f32, time: f64) -> &mut Self {
        self.push(Breakpoint {
            time,
            value,
            curve: Curve::Step,
        })
    }

    /// Ramp exponentially from the previous event to `value`, reached at `time`
    pub fn exponential_ramp_to(&mut self, value: f32, time: f64) -> &mut Self {
        self.push(Breakpoint {
            time,
            value: value.max(ENVELOPE_FLOOR),
            curve: Curve::Exponential,
        })
    }

    fn push(&mut self, point: Breakpoint) -> &mut Self {
        assert!(
            self.len < MAX_BREAKPOINTS,
            "Automation holds at most {} events",
            MAX_BREAKPOINTS
        );
        if let Some(last) = self.last() {
            assert!(point.time >= last.time, "Automation events must be time-ordered");
        }
        self.points[self.len] = point;
        self.len += 1;
        self
    }

    /// Events in time order
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.points[..self.len]
    }

    pub fn last(&self) -> Option<&Breakpoint> {
        self.breakpoints().last()
    }

    /// Time of the last event, if any
    pub fn end_time(&self) -> Option<f64> {
        self.last().map(|point| point.time)
    }

    /// Value of the parameter at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let mut previous_time = 0.0;
        let mut previous_value = self.default_value;

        for point in self.breakpoints() {
            if time < point.time {
                return match point.curve {
                    // Step events only take effect at their own time
                    Curve::Step => previous_value,
                    Curve::Exponential => exponential(
                        previous_value,
                        point.value,
                        previous_time,
                        point.time,
                        time,
                    ),
                };
            }
            previous_time = point.time;
            previous_value = point.value;
        }

        previous_value
    }
}

impl Default for Automation {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[inline]
fn exponential(from: f32, to: f32, start: f64, end: f64, time: f64) -> f32 {
    let span = end - start;
    if span <= 0.0 {
        return to;
    }
    // Exponential interpolation needs both ends on the same side of zero
    let from = from.max(ENVELOPE_FLOOR);
    let progress = ((time - start) / span).clamp(0.0, 1.0) as f32;
    from * (to / from).powf(progress)
}

/// Attack/decay shape of a voice, in seconds relative to its start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    /// Level reached at the end of the attack
    pub peak: f32,
    /// Time from start to peak
    pub attack: f64,
    /// Time from start until the level is back at the floor
    pub release_at: f64,
}

impl EnvelopeShape {
    pub fn new(peak: f32, attack: f64, release_at: f64) -> Self {
        assert!(attack > 0.0, "Attack must be > 0");
        assert!(release_at > attack, "Release must end after the attack");
        Self {
            peak,
            attack,
            release_at,
        }
    }

    /// Three-breakpoint gain timeline: floor at start, peak, floor again
    pub fn automation(&self, start: f64) -> Automation {
        let mut gain = Automation::new(ENVELOPE_FLOOR);
        gain.set_value_at(ENVELOPE_FLOOR, start)
            .exponential_ramp_to(self.peak, start + self.attack)
            .exponential_ramp_to(ENVELOPE_FLOOR, start + self.release_at);
        gain
    }
}
