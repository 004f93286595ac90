// Timer - Host-side repeating re-arm timer
//
// The control side never blocks: a host loop pumps the controller, which asks
// each timer whether a tick is due. Cancellation is checked before every tick,
// so a cancelled timer never fires again even if ticks were pending.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic wall clock of the host loop
pub trait HostClock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Real time, measured from creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand (offline rendering, tests)
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.nanos.store(now.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn set_seconds(&self, seconds: f64) {
        self.set(Duration::from_secs_f64(seconds.max(0.0)));
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl HostClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Shared cancellation flag of a timer
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fires every `period`, first one period after arming
#[derive(Debug)]
pub struct RepeatingTimer {
    period: Duration,
    next_due: Duration,
    token: CancelToken,
}

impl RepeatingTimer {
    pub fn arm(now: Duration, period: Duration) -> Self {
        // A zero period would fire forever within one poll
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: now + period,
            token: CancelToken::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Host time of the next tick
    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_armed(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Consume one due tick, if any
    ///
    /// Call in a loop: a host that fell behind gets every missed tick, one
    /// per call, until the timer catches up with `now`.
    pub fn fire_due(&mut self, now: Duration) -> bool {
        if self.token.is_cancelled() || now < self.next_due {
            return false;
        }
        self.next_due += self.period;
        true
    }
}
