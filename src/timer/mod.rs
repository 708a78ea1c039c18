//! Time and delay scheduling.
//!
//! All elapsed-time computation and tick scheduling goes through a
//! [`TimerSource`] so that tests can drive virtual time with
//! [`MockTimer`] instead of waiting on the wall clock.
//!
//! # Modules
//!
//! - [`mock`] - Virtual-time timer for tests

pub mod mock;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub use mock::MockTimer;

/// Identifies one scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Clock and timeout scheduling.
///
/// Timeouts carry no callback: the holder asks for [`remaining`] and acts
/// when it reaches zero. A timeout stays armed until cleared, even after it
/// is due.
///
/// [`remaining`]: TimerSource::remaining
pub trait TimerSource {
    /// Time since the source was created.
    fn now(&self) -> Duration;

    /// Arm a timeout due `delay` from now.
    fn set_timeout(&self, delay: Duration) -> TimerHandle;

    /// Disarm a timeout. Clearing an unknown handle is a no-op.
    fn clear_timeout(&self, handle: TimerHandle);

    /// Time left until the timeout is due, zero once due, `None` if cleared.
    fn remaining(&self, handle: TimerHandle) -> Option<Duration>;
}

/// Wall-clock timer source.
#[derive(Debug)]
pub struct SystemTimer {
    origin: Instant,
    next_id: AtomicU64,
    deadlines: Mutex<HashMap<TimerHandle, Instant>>,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: AtomicU64::new(1),
            deadlines: Mutex::new(HashMap::new()),
        }
    }

    /// Number of timeouts currently armed.
    pub fn active_timers(&self) -> usize {
        self.deadlines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSource for SystemTimer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn set_timeout(&self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.deadlines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Instant::now() + delay);
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.deadlines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
    }

    fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        self.deadlines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// A recurring tick that is disarmed when dropped.
///
/// Holding the tick in a guard means every exit path of a step, including
/// `?` propagation and a panicking progress sink, releases the timer.
pub struct TickGuard<'a> {
    timer: &'a dyn TimerSource,
    interval: Duration,
    handle: Option<TimerHandle>,
}

impl<'a> TickGuard<'a> {
    /// Arm the first tick, due one `interval` from now.
    pub fn start(timer: &'a dyn TimerSource, interval: Duration) -> Self {
        let handle = timer.set_timeout(interval);
        Self {
            timer,
            interval,
            handle: Some(handle),
        }
    }

    /// Time left until the next tick; zero when due or stopped.
    pub fn remaining(&self) -> Duration {
        self.handle
            .and_then(|h| self.timer.remaining(h))
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the current tick is due.
    pub fn is_due(&self) -> bool {
        self.handle.is_some() && self.remaining().is_zero()
    }

    /// Consume the due tick and arm the next one.
    pub fn rearm(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.timer.clear_timeout(handle);
        }
        self.handle = Some(self.timer.set_timeout(self.interval));
    }

    /// Disarm the tick. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.timer.clear_timeout(handle);
        }
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_timer_tracks_armed_timeouts() {
        let timer = SystemTimer::new();
        let a = timer.set_timeout(Duration::from_secs(60));
        let b = timer.set_timeout(Duration::from_secs(60));
        assert_ne!(a, b);
        assert_eq!(timer.active_timers(), 2);

        timer.clear_timeout(a);
        assert_eq!(timer.active_timers(), 1);
        assert!(timer.remaining(a).is_none());
        assert!(timer.remaining(b).unwrap() <= Duration::from_secs(60));
    }

    #[test]
    fn system_timer_remaining_reaches_zero() {
        let timer = SystemTimer::new();
        let h = timer.set_timeout(Duration::ZERO);
        assert_eq!(timer.remaining(h), Some(Duration::ZERO));
    }

    #[test]
    fn system_timer_clock_advances() {
        let timer = SystemTimer::new();
        let before = timer.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.now() > before);
    }

    #[test]
    fn tick_guard_clears_on_drop() {
        let timer = MockTimer::new();
        {
            let _tick = TickGuard::start(&timer, Duration::from_secs(1));
            assert_eq!(timer.active_timers(), 1);
        }
        assert_eq!(timer.active_timers(), 0);
    }

    #[test]
    fn tick_guard_rearm_keeps_one_timer() {
        let timer = MockTimer::new();
        let mut tick = TickGuard::start(&timer, Duration::from_secs(1));
        assert!(!tick.is_due());

        timer.advance(Duration::from_secs(1));
        assert!(tick.is_due());

        tick.rearm();
        assert_eq!(timer.active_timers(), 1);
        assert_eq!(tick.remaining(), Duration::from_secs(1));
    }

    #[test]
    fn tick_guard_stop_is_idempotent() {
        let timer = MockTimer::new();
        let mut tick = TickGuard::start(&timer, Duration::from_secs(1));
        tick.stop();
        tick.stop();
        assert_eq!(timer.active_timers(), 0);
        assert!(!tick.is_due());
    }
}
