//! The record every backend embeds: resolution stamp, recorded outcome,
//! options and deadline, scoped to the current generation.

use crate::outcome::{Outcome, Settled};
use crate::timer::Timer;
use crate::{Error, Options, Result};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Resolution stamp of a generation that has not been resolved.
pub(crate) const UNRESOLVED: i64 = 0;
/// Stamp of a promise built pre-resolved with nothing recorded.
const RESOLVED_EMPTY: i64 = 1;

pub(crate) struct State<T> {
    resolved: AtomicI64,
    record: Mutex<Record<T>>,
}

pub(crate) struct Record<T> {
    generation: u64,
    outcome: Option<Settled<T>>,
    // Outcome of the generation right before this one, for waiters a reset
    // released after their generation had already settled.
    previous: Option<Settled<T>>,
    options: Option<Options>,
    deadline: Option<Instant>,
}

impl<T> State<T> {
    pub(crate) fn new(options: Option<Options>) -> Self {
        State {
            resolved: AtomicI64::new(UNRESOLVED),
            record: Mutex::new(Record {
                generation: 0,
                outcome: None,
                previous: None,
                options,
                deadline: None,
            }),
        }
    }

    pub(crate) fn resolved(outcome: Outcome<T>) -> Self {
        let stamp = if outcome.is_empty() {
            RESOLVED_EMPTY
        } else {
            now_nanos()
        };
        let state = State::new(None);
        state.record.lock().outcome = Some(outcome.into());
        state.resolved.store(stamp, Ordering::Release);
        state
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Record<T>> {
        self.record.lock()
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire) != UNRESOLVED
    }

    pub(crate) fn resolved_at(&self) -> Option<SystemTime> {
        match self.resolved.load(Ordering::Acquire) {
            UNRESOLVED => None,
            nanos => Some(UNIX_EPOCH + Duration::from_nanos(nanos.unsigned_abs())),
        }
    }

    pub(crate) fn options(&self) -> Option<Options> {
        self.record.lock().options.clone()
    }

    /// Last call wins.
    pub(crate) fn set_timeout(&self, timeout: Duration) {
        self.record.lock().deadline = Some(Instant::now() + timeout);
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.record.lock().deadline
    }

    /// Records the outcome and publishes the stamp. The caller has already
    /// arbitrated that this is the only resolution of the generation.
    pub(crate) fn settle_locked(&self, record: &mut Record<T>, outcome: Outcome<T>) {
        record.outcome = Some(outcome.into());
        self.resolved.store(now_nanos(), Ordering::Release);
    }

    /// Starts a new generation. Waiters of the old one find its outcome in
    /// `previous`, or a reset failure if it never settled.
    pub(crate) fn begin_generation_locked(&self, record: &mut Record<T>, options: Option<Options>) {
        record.previous = Some(record.outcome.take().unwrap_or_else(Settled::reset));
        record.generation = record.generation.wrapping_add(1);
        record.options = options;
        record.deadline = None;
        self.resolved.store(UNRESOLVED, Ordering::Release);
    }
}

impl<T: Clone> State<T> {
    /// How a bounded wait on `generation` ended once it was released: `Ok` if
    /// the generation resolved, the reset failure if a reset cut it short.
    pub(crate) fn released(&self, generation: u64) -> Result<()> {
        match self.record.lock().outcome_for(generation) {
            Some(settled) if settled.is_reset() => Err(Error::Reset),
            _ => Ok(()),
        }
    }
}

impl<T> Record<T> {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }

    /// Creates the deadline timer for a bounded wait. An inline `timeout`
    /// applies to this call only and does not replace the stored deadline.
    pub(crate) fn arm_timer(&self, timeout: Option<Duration>) -> Result<Timer> {
        if self.is_settled() {
            return Err(Error::AlreadyResolved);
        }
        let deadline = match timeout {
            Some(timeout) => Instant::now() + timeout,
            None => self.deadline.ok_or(Error::NoDeadlineSet)?,
        };
        Ok(Timer::new(deadline))
    }
}

impl<T: Clone> Record<T> {
    /// The outcome a waiter that started in `generation` should see, or
    /// `None` while that generation is still current and unresolved.
    pub(crate) fn outcome_for(&self, generation: u64) -> Option<Settled<T>> {
        if generation == self.generation {
            self.outcome.clone()
        } else if generation.wrapping_add(1) == self.generation {
            Some(self.previous.clone().unwrap_or_else(Settled::reset))
        } else {
            Some(Settled::reset())
        }
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_nanos()).ok())
        .map_or(RESOLVED_EMPTY, |nanos| nanos.max(RESOLVED_EMPTY))
}
