//! A reusable counting wait group.
//!
//! Waiters block while units of work are outstanding. Every time the count
//! drops to zero the group moves to a new epoch, and a waiter that entered in
//! an earlier epoch is released even if more work has been added since.

use parking_lot::{Condvar, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct WaitGroup {
    counter: Mutex<Counter>,
    cond: Condvar,
}

#[derive(Debug, Default)]
struct Counter {
    outstanding: usize,
    epoch: u64,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, units: usize) {
        self.counter.lock().outstanding += units;
    }

    /// Completes one unit. Returns `false` if nothing was outstanding.
    pub fn done(&self) -> bool {
        let mut counter = self.counter.lock();
        if counter.outstanding == 0 {
            return false;
        }
        counter.outstanding -= 1;
        if counter.outstanding == 0 {
            counter.epoch += 1;
            self.cond.notify_all();
        }
        true
    }

    /// Whether any unit is outstanding.
    pub fn is_waiting(&self) -> bool {
        self.counter.lock().outstanding > 0
    }

    pub fn epoch(&self) -> u64 {
        self.counter.lock().epoch
    }

    /// Blocks until the count reaches zero or the group leaves `epoch`.
    pub fn wait(&self, epoch: u64) {
        let mut counter = self.counter.lock();
        while counter.outstanding > 0 && counter.epoch == epoch {
            self.cond.wait(&mut counter);
        }
    }

    /// Like [`wait`](WaitGroup::wait) but gives up at `deadline`. Returns
    /// `true` if released.
    pub fn wait_until(&self, epoch: u64, deadline: Instant) -> bool {
        let mut counter = self.counter.lock();
        loop {
            if counter.outstanding == 0 || counter.epoch != epoch {
                return true;
            }
            if self.cond.wait_until(&mut counter, deadline).timed_out() {
                return counter.outstanding == 0 || counter.epoch != epoch;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WaitGroup;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_done_releases_waiters() {
        let wg = Arc::new(WaitGroup::new());
        wg.add(1);
        let epoch = wg.epoch();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let wg = wg.clone();
                thread::spawn(move || wg.wait(epoch))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        assert!(wg.done());
        assert!(!wg.done());
        for waiter in waiters {
            waiter.join().expect("waiter panicked");
        }
    }

    #[test]
    fn test_stale_epoch_is_not_blocked_by_rearm() {
        let wg = WaitGroup::new();
        wg.add(1);
        let epoch = wg.epoch();
        wg.done();
        wg.add(1);

        assert!(wg.is_waiting());
        wg.wait(epoch);
        assert!(wg.wait_until(epoch, Instant::now()));
    }

    #[test]
    fn test_wait_until_times_out() {
        let wg = WaitGroup::new();
        wg.add(1);
        let start = Instant::now();
        assert!(!wg.wait_until(wg.epoch(), start + Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
