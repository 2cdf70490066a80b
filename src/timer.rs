//! A one-shot deadline signal, the value handed out by `timeout_c`.
//!
//! A [`Timer`] becomes ready exactly at its deadline. Stopping it before then
//! releases every receiver with `None` instead. The timer itself is a
//! condvar-backed handle; [`Timer::channel`] adapts it to a
//! `flume::Receiver<Instant>` for callers that select over several channels.

use flume::Receiver;
use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Timer {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    deadline: Instant,
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl Timer {
    pub(crate) fn new(deadline: Instant) -> Self {
        Timer {
            inner: Arc::new(Inner {
                deadline,
                stopped: Mutex::new(false),
                cond: Condvar::new(),
            }),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.inner.deadline
    }

    /// Blocks until the deadline passes and returns it, or returns `None` once
    /// the timer has been stopped.
    pub fn recv(&self) -> Option<Instant> {
        let mut stopped = self.inner.stopped.lock();
        loop {
            if *stopped {
                return None;
            }
            if Instant::now() >= self.inner.deadline {
                return Some(self.inner.deadline);
            }
            self.inner.cond.wait_until(&mut stopped, self.inner.deadline);
        }
    }

    /// Non-blocking [`recv`](Timer::recv).
    pub fn try_recv(&self) -> Option<Instant> {
        let stopped = self.inner.stopped.lock();
        (!*stopped && Instant::now() >= self.inner.deadline).then_some(self.inner.deadline)
    }

    /// A channel that yields the deadline once it passes. Stopping the timer
    /// disconnects the channel instead. Spawns one thread per call to forward
    /// the firing.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_kit::Promise;
    /// use std::time::Duration;
    ///
    /// let promise = promise_kit::new::<u8>();
    /// let timer = promise.timeout_c(Some(Duration::from_millis(20))).unwrap();
    /// let fired = timer.channel().unwrap();
    /// assert_eq!(fired.recv(), Ok(timer.deadline()));
    /// ```
    pub fn channel(&self) -> io::Result<Receiver<Instant>> {
        let (tx, rx) = flume::bounded(1);
        let timer = self.clone();
        thread::Builder::new()
            .name("promise-timer".into())
            .spawn(move || {
                if let Some(deadline) = timer.recv() {
                    let _ = tx.send(deadline);
                }
            })?;
        Ok(rx)
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Prevents the timer from firing. Returns `false` if it had already fired
    /// or been stopped.
    pub fn stop(&self) -> bool {
        let mut stopped = self.inner.stopped.lock();
        if *stopped || Instant::now() >= self.inner.deadline {
            return false;
        }
        *stopped = true;
        self.inner.cond.notify_all();
        true
    }
}
