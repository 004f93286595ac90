// Playback controller - Play/stop state machine driving the loop scheduler
//
// One toggle entry point. Starting opens (or resumes) the audio context,
// creates a fresh master bus, schedules the first loop slightly in the future
// and arms a repeating timer that keeps one loop of look-ahead queued.
// Stopping cancels the timer and fades the master bus out; voices routed to
// the faded bus go with it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ringbuf::traits::Producer;

use crate::audio::{AudioContext, AudioError, AudioResult, BusId, OutputBus};
use crate::config::{ConfigError, PlaybackConfig};
use crate::messaging::{Notification, NotificationCategory, NotificationProducer};
use crate::sequencer::scheduler::LoopScheduler;
use crate::sequencer::timer::{HostClock, RepeatingTimer};
use crate::synth::envelope::ENVELOPE_FLOOR;

pub const PLAY_LABEL: &str = "🔊 PLAY MUSIC";
pub const STOP_LABEL: &str = "🔇 STOP MUSIC";

/// Opens the audio context on first use
pub type ContextOpener<C> = Box<dyn FnMut() -> AudioResult<C>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
}

/// The on-screen toggle the controller reflects its state into
pub trait ToggleControl {
    fn set_label(&mut self, label: &str);
    /// Add or remove the `playing` style class
    fn set_playing(&mut self, playing: bool);
}

/// Plain in-memory control (terminal front end, tests)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub label: String,
    pub playing: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            label: PLAY_LABEL.to_string(),
            playing: false,
        }
    }
}

impl ToggleControl for ControlState {
    fn set_label(&mut self, label: &str) {
        self.label.clear();
        self.label.push_str(label);
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

/// Everything owned by one play period
#[derive(Debug)]
pub struct PlaybackSession {
    master: BusId,
    loop_duration: f64,
    next_loop_start: f64,
    timer: RepeatingTimer,
}

impl PlaybackSession {
    pub fn master(&self) -> BusId {
        self.master
    }

    pub fn loop_duration(&self) -> f64 {
        self.loop_duration
    }

    /// Audio-clock start of the next loop to schedule
    pub fn next_loop_start(&self) -> f64 {
        self.next_loop_start
    }

    pub fn timer(&self) -> &RepeatingTimer {
        &self.timer
    }
}

pub struct PlaybackController<C: AudioContext, K: HostClock> {
    config: PlaybackConfig,
    scheduler: LoopScheduler,
    clock: K,
    opener: ContextOpener<C>,
    context: Option<C>,
    status: PlaybackStatus,
    session: Option<PlaybackSession>,
    notifications: Option<Arc<Mutex<NotificationProducer>>>,
}

impl<C: AudioContext, K: HostClock> PlaybackController<C, K> {
    /// Fails if `config` is out of range; a validated config keeps `toggle`
    /// infallible
    pub fn new(
        config: PlaybackConfig,
        clock: K,
        opener: ContextOpener<C>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            scheduler: LoopScheduler::default(),
            clock,
            opener,
            context: None,
            status: PlaybackStatus::Stopped,
            session: None,
            notifications: None,
        })
    }

    /// Forward soft failures to a notification queue as well as the log
    pub fn with_notifications(mut self, tx: Arc<Mutex<NotificationProducer>>) -> Self {
        self.notifications = Some(tx);
        self
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &LoopScheduler {
        &self.scheduler
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// Timers still able to fire (0 or 1)
    pub fn armed_timers(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| usize::from(session.timer.is_armed()))
    }

    /// Flip between playing and stopped
    ///
    /// Never fails: without audio the state and the control still flip.
    pub fn toggle(&mut self, control: &mut dyn ToggleControl) {
        match self.status {
            PlaybackStatus::Stopped => {
                self.start();
                self.status = PlaybackStatus::Playing;
                control.set_label(STOP_LABEL);
                control.set_playing(true);
            }
            PlaybackStatus::Playing => {
                self.teardown();
                self.status = PlaybackStatus::Stopped;
                control.set_label(PLAY_LABEL);
                control.set_playing(false);
            }
        }
        tracing::info!(status = ?self.status, "Playback toggled");
    }

    /// Fire due timer ticks and forward voices that are coming up; returns
    /// how many loops were scheduled
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now();
        let Some(context) = self.context.as_mut() else {
            return 0;
        };

        let mut scheduled = 0;
        if let Some(session) = self.session.as_mut() {
            while session.timer.fire_due(now) {
                let loop_start = session.next_loop_start;
                let mut bus = OutputBus::new(&mut *context, session.master);
                self.scheduler.schedule_loop(&mut bus, loop_start);
                session.next_loop_start = loop_start + session.loop_duration;
                scheduled += 1;
                tracing::debug!(loop_start, "Re-armed loop");
            }
        }
        context.forward_due();
        scheduled
    }

    fn start(&mut self) {
        // At most one live session
        self.teardown();

        if let Err(err) = self.acquire_context() {
            self.report(&err);
            return;
        }
        let Some(context) = self.context.as_mut() else {
            return;
        };

        let master = context.create_master(self.config.master_gain);
        let loop_duration = self.scheduler.loop_duration();
        let first_start = context.current_time() + self.config.start_delay;

        let mut bus = OutputBus::new(&mut *context, master);
        let next_loop_start = self.scheduler.schedule_loop(&mut bus, first_start);
        context.forward_due();

        let period = Duration::from_secs_f64(loop_duration * self.config.rearm_ratio);
        let timer = RepeatingTimer::arm(self.clock.now(), period);

        tracing::info!(
            %master,
            first_start,
            loop_duration,
            period_ms = period.as_millis() as u64,
            "Playback session started"
        );

        self.session = Some(PlaybackSession {
            master,
            loop_duration,
            next_loop_start,
            timer,
        });
    }

    fn acquire_context(&mut self) -> AudioResult<()> {
        if self.context.is_none() {
            self.context = Some((self.opener)()?);
        }
        if let Some(context) = self.context.as_mut() {
            if let Err(err) = context.resume() {
                // Reopen on the next start
                self.context = None;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Cancel the timer and fade the master bus out
    fn teardown(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.timer.cancel();

        if let Some(context) = self.context.as_mut() {
            let now = context.current_time();
            context.ramp_master(
                session.master,
                ENVELOPE_FLOOR,
                now,
                now + self.config.fade_out,
            );
            tracing::info!(master = %session.master, "Playback session stopped");
        }
    }

    fn report(&self, err: &AudioError) {
        tracing::warn!(%err, "Audio unavailable, playing silently");

        if let Some(tx) = &self.notifications {
            if let Ok(mut tx) = tx.try_lock() {
                let _ = tx.try_push(Notification::warning(
                    NotificationCategory::Playback,
                    format!("Audio unavailable: {}", err),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{FORWARD_WINDOW, OfflineContext};
    use crate::sequencer::timer::ManualClock;

    const SAMPLE_RATE: f32 = 8000.0;

    fn controller() -> (PlaybackController<OfflineContext, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let controller = PlaybackController::<OfflineContext, _>::new(
            PlaybackConfig::default(),
            clock.clone(),
            Box::new(|| Ok(OfflineContext::new(SAMPLE_RATE))),
        )
        .unwrap();
        (controller, clock)
    }

    #[test]
    fn test_initial_state() {
        let (controller, _) = controller();
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert!(controller.session().is_none());
        assert_eq!(controller.armed_timers(), 0);
        assert_eq!(ControlState::default().label, PLAY_LABEL);
    }

    #[test]
    fn test_start_schedules_first_loop() {
        let (mut controller, _) = controller();
        let mut control = ControlState::default();

        controller.toggle(&mut control);
        assert_eq!(controller.status(), PlaybackStatus::Playing);
        assert_eq!(control.label, STOP_LABEL);
        assert!(control.playing);
        assert_eq!(controller.armed_timers(), 1);

        let session = controller.session().unwrap();
        let loop_duration = 15.0 * 60.0 / 108.0;
        assert!((session.loop_duration() - loop_duration).abs() < 1e-9);
        assert!((session.next_loop_start() - (0.05 + loop_duration)).abs() < 1e-9);

        let context = controller.context().unwrap();
        assert_eq!(context.history().len(), 153);
        assert!(context.history().iter().all(|(bus, _)| *bus == session.master()));
    }

    #[test]
    fn test_timer_rearms_one_loop_per_tick() {
        let (mut controller, clock) = controller();
        let mut control = ControlState::default();
        controller.toggle(&mut control);

        let loop_duration = controller.scheduler().loop_duration();
        let first_next = controller.session().unwrap().next_loop_start();

        clock.set_seconds(loop_duration * 0.8 - 0.01);
        assert_eq!(controller.pump(), 0);

        clock.set_seconds(loop_duration * 0.8 + 0.01);
        assert_eq!(controller.pump(), 1);
        let next = controller.session().unwrap().next_loop_start();
        assert!((next - first_next - loop_duration).abs() < 1e-9);
    }

    #[test]
    fn test_stop_cancels_and_fades() {
        let (mut controller, clock) = controller();
        let mut control = ControlState::default();
        controller.toggle(&mut control);
        let master = controller.session().unwrap().master();

        controller.toggle(&mut control);
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert_eq!(control.label, PLAY_LABEL);
        assert!(!control.playing);
        assert_eq!(controller.armed_timers(), 0);

        let scheduled = controller.context().unwrap().history().len();
        clock.set_seconds(60.0);
        assert_eq!(controller.pump(), 0);
        assert_eq!(controller.context().unwrap().history().len(), scheduled);

        let gain = controller
            .context()
            .unwrap()
            .mixer()
            .bus_gain(master, 0.5)
            .unwrap();
        assert!((gain - ENVELOPE_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn test_restart_uses_a_fresh_bus() {
        let (mut controller, _) = controller();
        let mut control = ControlState::default();

        controller.toggle(&mut control);
        let first = controller.session().unwrap().master();
        controller.toggle(&mut control);
        controller.toggle(&mut control);
        let second = controller.session().unwrap().master();

        assert_ne!(first, second);
        assert_eq!(controller.armed_timers(), 1);
    }

    #[test]
    fn test_unavailable_audio_is_a_soft_failure() {
        let clock = ManualClock::new();
        let mut controller: PlaybackController<OfflineContext, ManualClock> =
            PlaybackController::new(
                PlaybackConfig::default(),
                clock,
                Box::new(|| Err(AudioError::NoDevice)),
            )
            .unwrap();
        let mut control = ControlState::default();

        controller.toggle(&mut control);
        assert_eq!(controller.status(), PlaybackStatus::Playing);
        assert_eq!(control.label, STOP_LABEL);
        assert!(controller.session().is_none());
        assert_eq!(controller.pump(), 0);

        controller.toggle(&mut control);
        assert_eq!(controller.status(), PlaybackStatus::Stopped);
        assert_eq!(control.label, PLAY_LABEL);
    }

    #[test]
    fn test_out_of_range_config_is_rejected() {
        for rearm_ratio in [-0.5, 0.0, f64::NAN] {
            let config = PlaybackConfig {
                rearm_ratio,
                ..PlaybackConfig::default()
            };
            let result = PlaybackController::<OfflineContext, _>::new(
                config,
                ManualClock::new(),
                Box::new(|| Ok(OfflineContext::new(SAMPLE_RATE))),
            );
            assert!(matches!(result, Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_only_upcoming_voices_reach_the_mixer() {
        let (mut controller, _) = controller();
        let mut control = ControlState::default();
        controller.toggle(&mut control);

        let context = controller.context().unwrap();
        let upcoming = context
            .history()
            .iter()
            .filter(|(_, voice)| voice.start < FORWARD_WINDOW)
            .count();
        assert!(upcoming > 0);
        assert_eq!(context.mixer().pending_voices(), upcoming);
        assert_eq!(context.staged_voices(), 153 - upcoming);
    }
}
