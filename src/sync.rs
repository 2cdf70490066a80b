//! A mutex and condvar promise. Resolution broadcasts on the condvar, and the
//! deadline timers handed out during a generation are tracked so they can be
//! stopped once it settles.

use crate::outcome::Outcome;
use crate::provider::{self, Provider};
use crate::state::{Record, State};
use crate::{Error, Options, Promise, Result, Timer};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, trace};

pub struct SyncPromise<T> {
    state: State<T>,
    cond: Condvar,
    timers: Mutex<Vec<Timer>>,
}

impl<T> SyncPromise<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_options(options: Options) -> Self {
        Self::build(Some(options))
    }

    pub fn resolved(outcome: Outcome<T>) -> Self {
        SyncPromise {
            state: State::resolved(outcome),
            cond: Condvar::new(),
            timers: Mutex::new(Vec::new()),
        }
    }

    fn build(options: Option<Options>) -> Self {
        SyncPromise {
            state: State::new(options),
            cond: Condvar::new(),
            timers: Mutex::new(Vec::with_capacity(2)),
        }
    }

    fn stop_timers(&self) {
        for timer in self.timers.lock().drain(..) {
            timer.stop();
        }
    }
}

impl<T> Default for SyncPromise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Provider<T> for SyncPromise<T> {
    fn state(&self) -> &State<T> {
        &self.state
    }

    fn wait(&self, mut record: MutexGuard<'_, Record<T>>) {
        let generation = record.generation();
        while record.generation() == generation && !record.is_settled() {
            self.cond.wait(&mut record);
        }
        // Timers armed after a reset belong to the new generation.
        if record.is_settled() {
            self.stop_timers();
        }
    }

    fn on_create_timer_locked(&self, timer: &Timer) {
        self.timers.lock().push(timer.clone());
    }
}

impl<T: Clone + Send> Promise<T> for SyncPromise<T> {
    fn reset_with_options(&self, options: Option<Options>) {
        let mut record = self.state.lock();
        if !record.is_settled() {
            debug!(generation = record.generation(), "released unresolved sync promise on reset");
        }
        self.state.begin_generation_locked(&mut record, options);
        self.cond.notify_all();
        self.stop_timers();
    }

    fn close(&self) {
        self.stop_timers();
    }

    fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    fn resolved_at(&self) -> Option<SystemTime> {
        self.state.resolved_at()
    }

    fn resolve(&self, outcome: Outcome<T>) -> Result<()> {
        let mut record = self.state.lock();
        if record.is_settled() {
            trace!(generation = record.generation(), "sync promise resolved already");
            return Err(Error::AlreadyResolved);
        }
        self.state.settle_locked(&mut record, outcome);
        self.cond.notify_all();
        self.stop_timers();
        Ok(())
    }

    fn options(&self) -> Option<Options> {
        self.state.options()
    }

    fn result(&self) -> (Option<T>, Option<Error>) {
        provider::settled(self).into_parts()
    }

    fn set_timeout(&self, timeout: Duration) {
        self.state.set_timeout(timeout)
    }

    fn deadline(&self) -> Option<Instant> {
        self.state.deadline()
    }

    fn timeout(&self, timeout: Option<Duration>) -> Result<()> {
        let (timer, generation) = {
            let record = self.state.lock();
            match provider::arm_timer(self, &record, timeout) {
                Ok(timer) => (timer, record.generation()),
                Err(Error::AlreadyResolved) => return Ok(()),
                Err(err) => return Err(err),
            }
        };
        // Returns early once the timer is stopped by a resolve, a reset or
        // close().
        let _ = timer.recv();
        let mut record = self.state.lock();
        while record.generation() == generation && !record.is_settled() {
            if self.cond.wait_until(&mut record, timer.deadline()).timed_out() {
                break;
            }
        }
        if record.generation() == generation && !record.is_settled() {
            debug!(generation, "sync promise deadline elapsed");
            return Err(Error::DeadlineElapsed);
        }
        drop(record);
        self.state.released(generation)
    }

    fn timeout_c(&self, timeout: Option<Duration>) -> Result<Timer> {
        provider::timeout_c(self, timeout)
    }
}
