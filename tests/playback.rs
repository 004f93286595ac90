//! Playback controller integration tests
//!
//! Drives the controller against an offline context and a hand-advanced host
//! clock, the way the renderer does, and checks the scheduling properties of
//! the loop: first-loop content, re-arm cadence, stop behaviour.

use spacejam_loop::audio::{AudioContext, AudioError, BusId, OfflineContext};
use spacejam_loop::config::PlaybackConfig;
use spacejam_loop::sequencer::{
    ControlState, ManualClock, PLAY_LABEL, PlaybackController, PlaybackStatus, STOP_LABEL,
};
use spacejam_loop::synth::envelope::ENVELOPE_FLOOR;
use spacejam_loop::synth::{ScheduledVoice, Timbre};

const SAMPLE_RATE: f32 = 8000.0;

type Controller = PlaybackController<OfflineContext, ManualClock>;

fn new_controller(config: PlaybackConfig) -> (Controller, ManualClock) {
    let clock = ManualClock::new();
    let controller = Controller::new(
        config,
        clock.clone(),
        Box::new(|| Ok(OfflineContext::new(SAMPLE_RATE))),
    )
    .unwrap();
    (controller, clock)
}

fn loop_duration() -> f64 {
    15.0 * 60.0 / 108.0
}

fn voices_of(controller: &Controller) -> Vec<(BusId, ScheduledVoice)> {
    controller.context().unwrap().history().to_vec()
}

/// Render offline until `seconds`, pumping the controller like a host loop
fn run_until(controller: &mut Controller, clock: &ManualClock, seconds: f64) {
    let mut block = vec![0.0; 80]; // 10 ms
    loop {
        let context = controller.context_mut().unwrap();
        if context.current_time() >= seconds {
            break;
        }
        context.render(&mut block);
        clock.set_seconds(context.current_time());
        controller.pump();
    }
}

#[test]
fn test_first_loop_content() {
    let (mut controller, _) = new_controller(PlaybackConfig::default());
    let mut control = ControlState::default();
    controller.toggle(&mut control);

    let voices = voices_of(&controller);
    let count = |timbre| voices.iter().filter(|(_, v)| v.timbre == timbre).count();
    assert_eq!(count(Timbre::Kick), 16);
    assert_eq!(count(Timbre::Snare), 16);
    assert_eq!(count(Timbre::Hat), 64);
    assert_eq!(count(Timbre::Bass), 9);

    // First lead note: C5 right after the start delay
    let (_, lead) = voices
        .iter()
        .find(|(_, v)| v.timbre == Timbre::Lead)
        .unwrap();
    assert!((lead.start - 0.05).abs() < 1e-9);
    assert_eq!(lead.start_frequency(), Some(523.25));
}

#[test]
fn test_loops_are_contiguous() {
    let (mut controller, clock) = new_controller(PlaybackConfig::default());
    let mut control = ControlState::default();
    controller.toggle(&mut control);

    let mut starts = vec![controller.session().unwrap().next_loop_start()];
    for tick in 1..=4 {
        clock.set_seconds(tick as f64 * 0.8 * loop_duration() + 1e-3);
        assert_eq!(controller.pump(), 1);
        starts.push(controller.session().unwrap().next_loop_start());
    }

    for pair in starts.windows(2) {
        assert!((pair[1] - pair[0] - loop_duration()).abs() < 1e-9);
    }

    // Every scheduled loop starts with the C5 lead
    let lead_starts: Vec<f64> = voices_of(&controller)
        .iter()
        .filter(|(_, v)| v.timbre == Timbre::Lead && v.start_frequency() == Some(523.25))
        .map(|(_, v)| v.start)
        .collect();
    for k in 0..5 {
        let expected = 0.05 + k as f64 * loop_duration();
        assert!(
            lead_starts.iter().any(|s| (s - expected).abs() < 1e-9),
            "no loop at {expected}"
        );
    }
}

#[test]
fn test_late_host_catches_up() {
    let (mut controller, clock) = new_controller(PlaybackConfig::default());
    let mut control = ControlState::default();
    controller.toggle(&mut control);

    // Host stalled for three periods
    clock.set_seconds(3.0 * 0.8 * loop_duration() + 1e-3);
    assert_eq!(controller.pump(), 3);
    let next = controller.session().unwrap().next_loop_start();
    assert!((next - (0.05 + 4.0 * loop_duration())).abs() < 1e-9);
}

#[test]
fn test_rearm_ratio_is_tunable() {
    let config = PlaybackConfig {
        rearm_ratio: 0.5,
        ..PlaybackConfig::default()
    };
    let (mut controller, clock) = new_controller(config);
    let mut control = ControlState::default();
    controller.toggle(&mut control);

    let period = controller.session().unwrap().timer().period().as_secs_f64();
    assert!((period - 0.5 * loop_duration()).abs() < 1e-6);

    clock.set_seconds(0.5 * loop_duration() + 1e-3);
    assert_eq!(controller.pump(), 1);
}

#[test]
fn test_double_toggle_stops_cleanly() {
    let (mut controller, clock) = new_controller(PlaybackConfig::default());
    let mut control = ControlState::default();

    controller.toggle(&mut control);
    run_until(&mut controller, &clock, 1.0);
    let master = controller.session().unwrap().master();
    let stopped_at = controller.context().unwrap().current_time();

    controller.toggle(&mut control);
    assert_eq!(controller.status(), PlaybackStatus::Stopped);
    assert_eq!(control, ControlState::default());
    assert_eq!(controller.armed_timers(), 0);

    // Gain fades to the floor within the fade-out window
    let mixer = controller.context().unwrap().mixer();
    let mid = mixer.bus_gain(master, stopped_at + 0.25).unwrap();
    let end = mixer.bus_gain(master, stopped_at + 0.5).unwrap();
    assert!(mid < 0.55 && mid > ENVELOPE_FLOOR);
    assert!((end - ENVELOPE_FLOOR).abs() < 1e-6);

    // Nothing else is scheduled, the faded bus is gone
    let scheduled = voices_of(&controller).len();
    run_until(&mut controller, &clock, 3.0 * loop_duration());
    assert_eq!(voices_of(&controller).len(), scheduled);
    assert_eq!(controller.context().unwrap().mixer().bus_count(), 0);
}

#[test]
fn test_toggle_labels() {
    let (mut controller, _) = new_controller(PlaybackConfig::default());
    let mut control = ControlState::default();

    for round in 0..3 {
        controller.toggle(&mut control);
        assert_eq!(control.label, STOP_LABEL, "round {round}");
        assert!(control.playing);
        controller.toggle(&mut control);
        assert_eq!(control.label, PLAY_LABEL, "round {round}");
        assert!(!control.playing);
    }
}

#[test]
fn test_restart_keeps_one_live_bus() {
    let (mut controller, clock) = new_controller(PlaybackConfig::default());
    let mut control = ControlState::default();

    controller.toggle(&mut control);
    controller.toggle(&mut control);
    controller.toggle(&mut control);
    let live = controller.session().unwrap().master();

    // The stopped bus is retired once its fade has run
    run_until(&mut controller, &clock, 1.0);
    let mixer = controller.context().unwrap().mixer();
    assert_eq!(mixer.bus_count(), 1);
    assert!(mixer.bus_gain(live, 1.0).is_some());
}

#[test]
fn test_context_unavailable_is_silent() {
    let mut controller: Controller = PlaybackController::new(
        PlaybackConfig::default(),
        ManualClock::new(),
        Box::new(|| Err(AudioError::Unavailable("no backend".to_string()))),
    )
    .unwrap();
    let mut control = ControlState::default();

    controller.toggle(&mut control);
    assert_eq!(controller.status(), PlaybackStatus::Playing);
    assert!(control.playing);
    assert!(controller.context().is_none());
    assert_eq!(controller.armed_timers(), 0);
    assert_eq!(controller.pump(), 0);
}

#[test]
fn test_context_recovers_on_next_start() {
    let mut attempts = 0;
    let mut controller: Controller = PlaybackController::new(
        PlaybackConfig::default(),
        ManualClock::new(),
        Box::new(move || {
            attempts += 1;
            if attempts == 1 {
                Err(AudioError::NoDevice)
            } else {
                Ok(OfflineContext::new(SAMPLE_RATE))
            }
        }),
    )
    .unwrap();
    let mut control = ControlState::default();

    controller.toggle(&mut control);
    assert!(controller.context().is_none());
    controller.toggle(&mut control);
    controller.toggle(&mut control);

    let context = controller.context().unwrap();
    assert!(context.is_running());
    assert!(!context.history().is_empty());
}
