//! What a synchronization backend supplies to the shared record, and the
//! operations written once on top of it.

use crate::outcome::Settled;
use crate::state::{Record, State};
use crate::timer::Timer;
use crate::Result;
use parking_lot::MutexGuard;
use std::time::Duration;

pub(crate) trait Provider<T>: Send + Sync {
    fn state(&self) -> &State<T>;

    /// Blocks until the generation observed through `record` settles or is
    /// replaced by a reset. Called with the record locked; implementations
    /// release the lock while blocked. Spurious returns are tolerated.
    fn wait(&self, record: MutexGuard<'_, Record<T>>);

    /// Called with the record locked for every timer handed out by
    /// `timeout_c`.
    fn on_create_timer_locked(&self, _timer: &Timer) {}
}

/// Blocks until the caller's generation has an outcome.
pub(crate) fn settled<T, P>(provider: &P) -> Settled<T>
where
    T: Clone,
    P: Provider<T> + ?Sized,
{
    let generation = provider.state().lock().generation();
    settled_after(provider, generation)
}

/// Blocks until `generation` has an outcome. A generation that has since been
/// reset reports the outcome it ended with.
pub(crate) fn settled_after<T, P>(provider: &P, generation: u64) -> Settled<T>
where
    T: Clone,
    P: Provider<T> + ?Sized,
{
    let mut record = provider.state().lock();
    loop {
        if let Some(settled) = record.outcome_for(generation) {
            return settled;
        }
        provider.wait(record);
        record = provider.state().lock();
    }
}

/// Arms a deadline timer while the record is locked, so a concurrent resolve
/// either lands before the check or after the timer exists.
pub(crate) fn arm_timer<T, P>(
    provider: &P,
    record: &Record<T>,
    timeout: Option<Duration>,
) -> Result<Timer>
where
    P: Provider<T> + ?Sized,
{
    let timer = record.arm_timer(timeout)?;
    provider.on_create_timer_locked(&timer);
    Ok(timer)
}

pub(crate) fn timeout_c<T, P>(provider: &P, timeout: Option<Duration>) -> Result<Timer>
where
    P: Provider<T> + ?Sized,
{
    let record = provider.state().lock();
    arm_timer(provider, &record, timeout)
}
