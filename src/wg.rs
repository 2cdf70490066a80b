//! A wait group promise models an unresolved generation as one outstanding
//! unit of work. Resolving completes the unit; waiters block until nothing is
//! outstanding.

use crate::outcome::Outcome;
use crate::provider::{self, Provider};
use crate::state::{Record, State};
use crate::wait_group::WaitGroup;
use crate::{Error, Options, Promise, Result, Timer};
use parking_lot::MutexGuard;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, trace};

pub struct WaitGroupPromise<T> {
    state: State<T>,
    wg: WaitGroup,
}

impl<T> WaitGroupPromise<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_options(options: Options) -> Self {
        Self::build(Some(options))
    }

    pub fn resolved(outcome: Outcome<T>) -> Self {
        WaitGroupPromise {
            state: State::resolved(outcome),
            wg: WaitGroup::new(),
        }
    }

    fn build(options: Option<Options>) -> Self {
        let promise = WaitGroupPromise {
            state: State::new(options),
            wg: WaitGroup::new(),
        };
        promise.wg.add(1);
        promise
    }

    /// Starts the next generation with one outstanding unit. A generation
    /// armed by a concurrent reset since this reset's force-resolve is
    /// released first.
    fn rearm(&self, options: Option<Options>) {
        let mut record = self.state.lock();
        if !record.is_settled() && self.wg.is_waiting() {
            self.state.settle_locked(&mut record, Outcome::reset());
            self.wg.done();
            debug!(generation = record.generation(), "released generation armed by a concurrent reset");
        }
        self.state.begin_generation_locked(&mut record, options);
        if !self.wg.is_waiting() {
            self.wg.add(1);
        }
    }
}

impl<T> Default for WaitGroupPromise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Provider<T> for WaitGroupPromise<T> {
    fn state(&self) -> &State<T> {
        &self.state
    }

    fn wait(&self, record: MutexGuard<'_, Record<T>>) {
        // Resolution completes the unit under the record lock, so the epoch
        // read here predates it.
        let epoch = self.wg.epoch();
        drop(record);
        self.wg.wait(epoch);
    }
}

impl<T: Clone + Send> Promise<T> for WaitGroupPromise<T> {
    /// Force-resolves the current generation with [`Error::Reset`] before
    /// arming a unit for the next one, so released waiters never block on the
    /// new unit.
    fn reset_with_options(&self, options: Option<Options>) {
        if self.resolve(Outcome::reset()).is_ok() {
            debug!("released unresolved wait group promise on reset");
        }
        thread::yield_now();
        self.rearm(options);
    }

    fn close(&self) {}

    fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    fn resolved_at(&self) -> Option<SystemTime> {
        self.state.resolved_at()
    }

    fn resolve(&self, outcome: Outcome<T>) -> Result<()> {
        let mut record = self.state.lock();
        if !self.wg.is_waiting() {
            trace!(generation = record.generation(), "wait group promise resolved already");
            return Err(Error::AlreadyResolved);
        }
        self.state.settle_locked(&mut record, outcome);
        self.wg.done();
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
        let (timer, epoch, generation) = {
            let record = self.state.lock();
            match provider::arm_timer(self, &record, timeout) {
                Ok(timer) => (timer, self.wg.epoch(), record.generation()),
                Err(Error::AlreadyResolved) => return Ok(()),
                Err(err) => return Err(err),
            }
        };
        if self.wg.wait_until(epoch, timer.deadline()) {
            self.state.released(generation)
        } else {
            debug!(generation, "wait group promise deadline elapsed");
            Err(Error::DeadlineElapsed)
        }
    }

    fn timeout_c(&self, timeout: Option<Duration>) -> Result<Timer> {
        provider::timeout_c(self, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::WaitGroupPromise;
    use crate::{Error, Outcome, Promise};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_unit_outstanding_until_resolved() {
        let promise = WaitGroupPromise::new();
        assert!(promise.wg.is_waiting());
        promise.resolve(Outcome::Value(9)).unwrap();
        assert!(!promise.wg.is_waiting());
        assert_eq!(promise.resolve(Outcome::Value(10)), Err(Error::AlreadyResolved));
        assert_eq!(promise.value(), Some(9));
    }

    #[test]
    fn test_reset_rearms_a_single_unit() {
        let promise = WaitGroupPromise::<u8>::new();
        promise.reset();
        promise.reset();
        assert!(promise.wg.is_waiting());

        promise.fulfill(1).unwrap();
        assert!(!promise.wg.is_waiting());
        assert!(promise.is_resolved());
    }

    #[test]
    fn test_rearm_releases_generation_armed_meanwhile() {
        let promise = Arc::new(WaitGroupPromise::<u8>::new());
        let waiter = {
            let promise = promise.clone();
            thread::spawn(move || promise.result())
        };
        thread::sleep(Duration::from_millis(50));

        // The second of two overlapping resets finds the generation the first
        // one armed still unresolved.
        promise.rearm(None);
        assert_eq!(
            waiter.join().expect("The waiter thread has panicked"),
            (None, Some(Error::Reset))
        );
        assert!(promise.wg.is_waiting());
        assert!(!promise.is_resolved());

        promise.fulfill(2).unwrap();
        assert_eq!(promise.value(), Some(2));
    }

    #[test]
    fn test_pre_resolved_has_nothing_outstanding() {
        let promise = WaitGroupPromise::resolved(Outcome::Value('x'));
        assert!(!promise.wg.is_waiting());
        assert_eq!(promise.fulfill('y'), Err(Error::AlreadyResolved));
        assert_eq!(promise.timeout(Some(Duration::from_millis(1))), Ok(()));
    }

    #[test]
    fn test_reset_releases_blocked_waiter() {
        let promise = Arc::new(WaitGroupPromise::<u8>::new());
        let waiter = {
            let promise = promise.clone();
            thread::spawn(move || promise.result())
        };

        thread::sleep(Duration::from_millis(50));
        promise.reset();
        assert_eq!(
            waiter.join().expect("The waiter thread has panicked"),
            (None, Some(Error::Reset))
        );
        assert!(!promise.is_resolved());
    }
}
