//! A channel promise signals resolution by closing a channel: the promise
//! holds the only sender and drops it once, which releases every receiver.
//! Each generation gets a fresh channel.
//!
use crate::outcome::Outcome;
use crate::provider::{self, Provider};
use crate::state::{Record, State};
use crate::{Error, Options, Promise, Result, Timer};
use flume::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, trace};

pub struct ChannelPromise<T> {
    state: State<T>,
    signal: Mutex<Signal>,
}

#[derive(Debug)]
struct Signal {
    sender: Option<Sender<()>>,
    receiver: Receiver<()>,
}

impl Signal {
    fn open() -> Self {
        let (tx, rx) = flume::bounded(0);
        Signal {
            sender: Some(tx),
            receiver: rx,
        }
    }

    fn closed() -> Self {
        let mut signal = Signal::open();
        signal.close();
        signal
    }

    fn close(&mut self) {
        self.sender.take();
    }

    fn is_closed(&self) -> bool {
        self.receiver.is_disconnected()
    }
}

impl<T> ChannelPromise<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_options(options: Options) -> Self {
        Self::build(Some(options))
    }

    /// # Examples
    ///
    /// ```
    /// use promise_kit::{ChannelPromise, Outcome, Promise};
    ///
    /// let promise = ChannelPromise::resolved(Outcome::Value(5));
    /// assert!(promise.is_resolved());
    /// assert_eq!(promise.value(), Some(5));
    /// ```
    pub fn resolved(outcome: Outcome<T>) -> Self {
        ChannelPromise {
            state: State::resolved(outcome),
            signal: Mutex::new(Signal::closed()),
        }
    }

    fn build(options: Option<Options>) -> Self {
        ChannelPromise {
            state: State::new(options),
            signal: Mutex::new(Signal::open()),
        }
    }

    /// Receiver for the current generation together with its number.
    fn subscribe(&self, record: &Record<T>) -> (Receiver<()>, u64) {
        (self.signal.lock().receiver.clone(), record.generation())
    }
}

impl<T: Clone + Send> ChannelPromise<T> {
    /// Waits for the caller's generation without blocking the thread, for use
    /// inside an executor.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_kit::{ChannelPromise, Promise};
    /// use futures::executor::block_on;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let promise = Arc::new(ChannelPromise::<u32>::new());
    /// let producer = promise.clone();
    /// let task = thread::spawn(move || producer.fulfill(42));
    /// assert_eq!(block_on(promise.value_async()), Some(42));
    /// task.join().expect("The task thread has panicked").unwrap();
    /// ```
    pub async fn result_async(&self) -> (Option<T>, Option<Error>) {
        let (receiver, generation) = {
            let record = self.state.lock();
            if let Some(settled) = record.outcome_for(record.generation()) {
                return settled.into_parts();
            }
            self.subscribe(&record)
        };
        // Only disconnection ever completes the receive.
        let _ = receiver.recv_async().await;
        provider::settled_after(self, generation).into_parts()
    }

    pub async fn value_async(&self) -> Option<T> {
        self.result_async().await.0
    }

    pub async fn error_async(&self) -> Option<Error> {
        self.result_async().await.1
    }
}

impl<T> Default for ChannelPromise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Provider<T> for ChannelPromise<T> {
    fn state(&self) -> &State<T> {
        &self.state
    }

    fn wait(&self, record: MutexGuard<'_, Record<T>>) {
        let (receiver, _) = self.subscribe(&record);
        drop(record);
        let _ = receiver.recv();
    }
}

impl<T: Clone + Send> Promise<T> for ChannelPromise<T> {
    fn reset_with_options(&self, options: Option<Options>) {
        let mut record = self.state.lock();
        let mut signal = self.signal.lock();
        if !signal.is_closed() {
            self.state.settle_locked(&mut record, Outcome::reset());
            signal.close();
            debug!(generation = record.generation(), "released unresolved channel promise on reset");
        }
        self.state.begin_generation_locked(&mut record, options);
        *signal = Signal::open();
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
        let mut signal = self.signal.lock();
        if signal.is_closed() {
            trace!(generation = record.generation(), "channel promise resolved already");
            return Err(Error::AlreadyResolved);
        }
        self.state.settle_locked(&mut record, outcome);
        signal.close();
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
        let (timer, receiver, generation) = {
            let record = self.state.lock();
            let timer = match provider::arm_timer(self, &record, timeout) {
                Err(Error::AlreadyResolved) => return Ok(()),
                armed => armed?,
            };
            let (receiver, generation) = self.subscribe(&record);
            (timer, receiver, generation)
        };
        match receiver.recv_deadline(timer.deadline()) {
            Err(RecvTimeoutError::Timeout) => {
                debug!(generation, "channel promise deadline elapsed");
                Err(Error::DeadlineElapsed)
            }
            _ => self.state.released(generation),
        }
    }

    fn timeout_c(&self, timeout: Option<Duration>) -> Result<Timer> {
        provider::timeout_c(self, timeout)
    }
}
