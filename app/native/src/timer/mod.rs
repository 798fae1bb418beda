//! Interval timer.
//!
//! Invokes a callback every `delay` minutes. Stopping the timer persists the
//! whole minutes already waited (`elapsed-time`), so the next `begin` (in this
//! process or the next one) only waits for the remainder of the interval.
//!
//! At most one wake is pending at any time: every (re)arm cancels the previous
//! wake first, and wakes that were cancelled or superseded are ignored.

mod scheduler;

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub use scheduler::{DeadlineScheduler, ManualScheduler, Scheduler, WakeHandle};

use crate::constants::MILLIS_PER_MINUTE;
use crate::error::BackslideError;
use crate::settings::Settings;

/// Whether the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

type TimerCallback = Box<dyn FnMut()>;

/// Fires a callback once per interval, resuming partially waited intervals.
pub struct IntervalTimer<S: Scheduler> {
    settings: Rc<Settings>,
    scheduler: S,
    state: TimerState,
    delay: u32,
    elapsed: u32,
    started_at: Option<Instant>,
    wake: Option<WakeHandle>,
    /// The pending wake covers only the remainder of a resumed interval.
    shortened: bool,
    callback: Option<TimerCallback>,
}

impl<S: Scheduler + fmt::Debug> fmt::Debug for IntervalTimer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("state", &self.state)
            .field("delay", &self.delay)
            .field("elapsed", &self.elapsed)
            .field("wake", &self.wake)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl<S: Scheduler> IntervalTimer<S> {
    /// Creates a stopped timer using the delay and elapsed time stored in `settings`.
    #[must_use]
    pub fn new(settings: Rc<Settings>, scheduler: S) -> Self {
        Self {
            delay: settings.delay(),
            elapsed: settings.elapsed_time(),
            settings,
            scheduler,
            state: TimerState::Stopped,
            started_at: None,
            wake: None,
            shortened: false,
            callback: None,
        }
    }

    /// Registers the function called when an interval completes.
    pub fn set_callback<F>(&mut self, callback: F)
    where F: FnMut() + 'static {
        self.callback = Some(Box::new(callback));
    }

    /// Starts counting down. Does nothing if already running.
    pub fn begin(&mut self) {
        if self.state == TimerState::Running {
            return;
        }

        self.arm();
        self.state = TimerState::Running;
        tracing::debug!(delay = self.delay, elapsed = self.elapsed, "timer started");
    }

    /// Stops counting down and persists the whole minutes waited so far.
    ///
    /// Does nothing if already stopped.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the elapsed time could not be persisted. The
    /// timer is stopped either way.
    pub fn stop(&mut self) -> Result<(), BackslideError> {
        if self.state == TimerState::Stopped {
            return Ok(());
        }

        self.disarm();
        self.elapsed = self.elapsed_minutes();
        self.started_at = None;
        self.state = TimerState::Stopped;

        tracing::debug!(elapsed = self.elapsed, "timer stopped");
        self.settings.set_elapsed_time(self.elapsed)
    }

    /// Starts a fresh full interval, whether or not the timer was running.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the reset elapsed time could not be persisted.
    /// The timer is running either way.
    pub fn restart(&mut self) -> Result<(), BackslideError> {
        self.elapsed = 0;

        let persisted = if self.state == TimerState::Running {
            self.started_at = Some(self.scheduler.now());
            self.stop()
        } else {
            self.settings.set_elapsed_time(0)
        };
        self.begin();
        persisted
    }

    /// Handles a due wake from the scheduler.
    ///
    /// Wakes that were cancelled or superseded are ignored. Otherwise the
    /// callback runs and a full interval is scheduled next.
    ///
    /// # Errors
    ///
    /// Returns `NoCallback` if no callback is registered (the next interval is
    /// still scheduled), or `NotWritable` if clearing the persisted elapsed
    /// time failed.
    pub fn on_wake(&mut self, handle: WakeHandle) -> Result<(), BackslideError> {
        if self.state != TimerState::Running || self.wake != Some(handle) {
            tracing::trace!(?handle, "ignoring stale wake");
            return Ok(());
        }
        self.wake = None;

        let fired = match self.callback.as_mut() {
            Some(callback) => {
                callback();
                Ok(())
            }
            None => Err(BackslideError::NoCallback),
        };

        let was_shortened = self.shortened;
        self.elapsed = 0;
        self.arm();

        // The stored value still holds the minutes the resumed interval started from
        if was_shortened {
            self.settings.set_elapsed_time(0)?;
        }
        fired
    }

    /// Applies a new delay. A running timer restarts with a full interval.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the restart could not persist the elapsed time.
    pub fn on_delay_changed(&mut self, minutes: u32) -> Result<(), BackslideError> {
        self.delay = minutes;

        if self.state == TimerState::Running {
            tracing::info!(delay = minutes, "delay changed, restarting timer");
            return self.restart();
        }
        Ok(())
    }

    /// Forgets the minutes waited while stopped, so the next `begin` waits a
    /// full interval.
    ///
    /// # Errors
    ///
    /// Returns `NotWritable` if the elapsed time could not be persisted.
    pub fn reset_elapsed(&mut self) -> Result<(), BackslideError> {
        if self.state == TimerState::Running {
            return self.restart();
        }

        self.elapsed = 0;
        self.settings.set_elapsed_time(0)
    }

    #[must_use]
    pub const fn state(&self) -> TimerState { self.state }

    #[must_use]
    pub fn is_running(&self) -> bool { self.state == TimerState::Running }

    /// Configured minutes between two wakes.
    #[must_use]
    pub const fn delay(&self) -> u32 { self.delay }

    /// Whole minutes waited within the current interval.
    #[must_use]
    pub fn elapsed_minutes(&self) -> u32 {
        let running = self.started_at.map_or(0, |start| whole_minutes(self.scheduler.now() - start));
        self.elapsed.saturating_add(running)
    }

    /// Time left until the next wake, if running.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        let start = self.started_at?;
        if self.state != TimerState::Running {
            return None;
        }

        let remaining = minutes_to_duration(self.delay.saturating_sub(self.elapsed));
        Some(remaining.saturating_sub(self.scheduler.now() - start))
    }

    #[must_use]
    pub const fn scheduler(&self) -> &S { &self.scheduler }

    pub const fn scheduler_mut(&mut self) -> &mut S { &mut self.scheduler }

    /// Cancels any pending wake and schedules the rest of the interval.
    fn arm(&mut self) {
        self.disarm();

        if self.elapsed >= self.delay {
            tracing::warn!(
                elapsed = self.elapsed,
                delay = self.delay,
                "stored elapsed time exceeds the delay, starting a full interval"
            );
            self.elapsed = 0;
        }

        self.started_at = Some(self.scheduler.now());
        self.shortened = self.elapsed > 0;
        self.wake = Some(self.scheduler.schedule_once(minutes_to_duration(self.delay - self.elapsed)));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.wake.take() {
            self.scheduler.cancel(handle);
        }
    }
}

fn minutes_to_duration(minutes: u32) -> Duration {
    Duration::from_millis(u64::from(minutes) * MILLIS_PER_MINUTE)
}

fn whole_minutes(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis() / u128::from(MILLIS_PER_MINUTE)).unwrap_or(u32::MAX)
}
