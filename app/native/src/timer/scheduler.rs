//! One-shot wake scheduling for the interval timer.
//!
//! Schedulers only record deadlines. Whoever owns the scheduler polls it for
//! due handles and forwards them to the timer, which keeps every wake on the
//! thread that owns the timer.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Identifies a scheduled wake. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WakeHandle(u64);

/// Source of time and one-shot wakes.
pub trait Scheduler {
    /// Current time on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Schedules a single wake `delay` from now.
    fn schedule_once(&mut self, delay: Duration) -> WakeHandle;

    /// Cancels a pending wake. Returns whether it was still pending.
    ///
    /// Once this returns, the handle is never reported as due.
    fn cancel(&mut self, handle: WakeHandle) -> bool;
}

/// Scheduler on the real clock, polled by the daemon's event loop.
#[derive(Debug, Default)]
pub struct DeadlineScheduler {
    next_id: u64,
    pending: BTreeMap<WakeHandle, Instant>,
}

impl DeadlineScheduler {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> { self.pending.values().min().copied() }

    /// Removes and returns every wake due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<WakeHandle> {
        let mut due: Vec<(Instant, WakeHandle)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(handle, deadline)| (*deadline, *handle))
            .collect();
        due.sort_unstable();

        for (_, handle) in &due {
            self.pending.remove(handle);
        }
        due.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Number of pending wakes.
    #[must_use]
    pub fn pending_count(&self) -> usize { self.pending.len() }
}

impl Scheduler for DeadlineScheduler {
    fn now(&self) -> Instant { Instant::now() }

    fn schedule_once(&mut self, delay: Duration) -> WakeHandle {
        let handle = WakeHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert(handle, Instant::now() + delay);
        handle
    }

    fn cancel(&mut self, handle: WakeHandle) -> bool { self.pending.remove(&handle).is_some() }
}

/// Scheduler on a virtual clock that only moves when told to.
///
/// Useful wherever the timer must be driven deterministically, such as in
/// tests or when replaying a recorded session.
#[derive(Debug)]
pub struct ManualScheduler {
    origin: Instant,
    offset: Duration,
    next_id: u64,
    pending: BTreeMap<WakeHandle, Duration>,
}

impl Default for ManualScheduler {
    fn default() -> Self { Self::new() }
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Duration::ZERO,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Moves the clock forward and returns the wakes that became due,
    /// earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<WakeHandle> {
        self.offset += by;

        let mut due: Vec<(Duration, WakeHandle)> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= self.offset)
            .map(|(handle, at)| (*at, *handle))
            .collect();
        due.sort_unstable();

        for (_, handle) in &due {
            self.pending.remove(handle);
        }
        due.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Time left until the earliest pending wake.
    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        self.pending.values().min().map(|at| at.saturating_sub(self.offset))
    }

    /// Number of pending wakes.
    #[must_use]
    pub fn pending_count(&self) -> usize { self.pending.len() }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant { self.origin + self.offset }

    fn schedule_once(&mut self, delay: Duration) -> WakeHandle {
        let handle = WakeHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert(handle, self.offset + delay);
        handle
    }

    fn cancel(&mut self, handle: WakeHandle) -> bool { self.pending.remove(&handle).is_some() }
}
