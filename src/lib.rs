//! Reusable promises that many threads can wait on, resolve once per
//! generation, time out on, and reset for reuse.
//!
//! Three backends implement the same [`Promise`] contract:
//!
//! - [`ChannelPromise`]: a channel closed exactly once signals resolution.
//! - [`SyncPromise`]: a mutex and condvar, tracking deadline timers for cleanup.
//! - [`WaitGroupPromise`]: one outstanding unit on a counting wait group.
//!
//! # Examples
//!
//! ```
//! use promise_kit::{Outcome, Promise};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let promise = Arc::new(promise_kit::new::<String>());
//! let producer = promise.clone();
//! let task = thread::spawn(move || producer.resolve(Outcome::Value("🍓".into())));
//!
//! assert_eq!(promise.value(), Some("🍓".to_string()));
//! task.join().expect("The producer thread has panicked").unwrap();
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

pub mod channel;
pub mod config;
mod error;
mod outcome;
pub mod pool;
mod provider;
mod state;
pub mod sync;
mod timer;
pub mod wait_group;
pub mod wg;

pub use channel::ChannelPromise;
pub use config::{PromiseConfig, Strategy};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use pool::Pool;
pub use sync::SyncPromise;
pub use timer::Timer;
pub use wg::WaitGroupPromise;

/// Opaque caller context carried by a promise and never touched by it.
pub type Options = Arc<dyn Any + Send + Sync>;

/// A value container resolved at most once per generation.
///
/// A generation runs from construction, or the last reset, to the next
/// reset. Blocking getters wait for the caller's generation; a reset releases
/// them with [`Error::Reset`] if that generation never resolved.
pub trait Promise<T>: Send + Sync {
    fn reset(&self) {
        self.reset_with_options(None)
    }

    /// Starts a new generation carrying `options`, releasing every waiter of
    /// the previous one.
    fn reset_with_options(&self, options: Option<Options>);

    /// Releases backend resources such as armed timers. Idempotent.
    fn close(&self);

    fn is_resolved(&self) -> bool;

    /// When the current generation resolved, `None` while unresolved.
    fn resolved_at(&self) -> Option<SystemTime>;

    /// Settles the current generation and wakes its waiters. Every call after
    /// the first one in a generation fails with [`Error::AlreadyResolved`].
    fn resolve(&self, outcome: Outcome<T>) -> Result<()>;

    fn fulfill(&self, value: T) -> Result<()> {
        self.resolve(Outcome::Value(value))
    }

    fn reject(&self, err: Error) -> Result<()> {
        self.resolve(Outcome::error(err))
    }

    fn options(&self) -> Option<Options>;

    /// Blocks until resolved.
    fn value(&self) -> Option<T> {
        self.result().0
    }

    /// Blocks until resolved.
    fn result(&self) -> (Option<T>, Option<Error>);

    /// Blocks until resolved.
    fn error(&self) -> Option<Error> {
        self.result().1
    }

    /// Sets the deadline `timeout` from now.
    fn set_timeout(&self, timeout: Duration);

    fn deadline(&self) -> Option<Instant>;

    /// Blocks until the promise resolves or the deadline passes.
    ///
    /// `timeout`, if given, replaces the stored deadline for this call only.
    /// Returns `Ok` straight away on a resolved promise,
    /// [`Error::NoDeadlineSet`] without any deadline, and
    /// [`Error::DeadlineElapsed`] when time runs out first.
    fn timeout(&self, timeout: Option<Duration>) -> Result<()>;

    /// Returns a [`Timer`] that fires at the deadline. Fails with
    /// [`Error::AlreadyResolved`] or [`Error::NoDeadlineSet`]; a deadline in
    /// the past yields a timer that is ready immediately.
    fn timeout_c(&self, timeout: Option<Duration>) -> Result<Timer>;
}

/// A fresh promise on the default backend.
pub fn new<T>() -> ChannelPromise<T> {
    ChannelPromise::new()
}

pub fn with_options<T>(options: Options) -> ChannelPromise<T> {
    ChannelPromise::with_options(options)
}

/// A promise already resolved with `outcome`.
pub fn resolved<T>(outcome: Outcome<T>) -> ChannelPromise<T> {
    ChannelPromise::resolved(outcome)
}
