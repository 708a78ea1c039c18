//! Virtual-time timer for testing.
//!
//! `MockTimer` implements [`TimerSource`] over a clock that only moves when
//! told to. Clones share the same clock, so a [`MockRunner`] holding a clone
//! can advance time while the code under test waits on it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use prereqs::timer::{MockTimer, TimerSource};
//!
//! let timer = MockTimer::new();
//! let tick = timer.set_timeout(Duration::from_secs(1));
//! timer.advance(Duration::from_millis(400));
//! assert_eq!(timer.remaining(tick), Some(Duration::from_millis(600)));
//!
//! timer.clear_timeout(tick);
//! assert_eq!(timer.active_timers(), 0);
//! ```
//!
//! [`MockRunner`]: crate::shell::MockRunner

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{TimerHandle, TimerSource};

#[derive(Debug, Default)]
struct ClockState {
    now: Duration,
    next_id: u64,
    deadlines: BTreeMap<TimerHandle, Duration>,
    scheduled: usize,
}

/// Virtual clock with inspectable timers.
#[derive(Debug, Clone, Default)]
pub struct MockTimer {
    state: Arc<Mutex<ClockState>>,
}

impl MockTimer {
    /// Create a timer whose clock starts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.state().now += by;
    }

    /// Move the clock to `at`; never moves it backwards.
    pub fn advance_to(&self, at: Duration) {
        let mut state = self.state();
        if at > state.now {
            state.now = at;
        }
    }

    /// Number of timeouts currently armed.
    pub fn active_timers(&self) -> usize {
        self.state().deadlines.len()
    }

    /// Number of timeouts ever armed.
    pub fn timers_scheduled(&self) -> usize {
        self.state().scheduled
    }
}

impl TimerSource for MockTimer {
    fn now(&self) -> Duration {
        self.state().now
    }

    fn set_timeout(&self, delay: Duration) -> TimerHandle {
        let mut state = self.state();
        state.next_id += 1;
        state.scheduled += 1;
        let handle = TimerHandle::new(state.next_id);
        let due = state.now + delay;
        state.deadlines.insert(handle, due);
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.state().deadlines.remove(&handle);
    }

    fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        let state = self.state();
        state
            .deadlines
            .get(&handle)
            .map(|due| due.saturating_sub(state.now))
    }
}
