//! An explicitly owned pool of resolved promises kept for reuse.
//!
//! # Examples
//!
//! ```
//! use promise_kit::{Pool, Promise, SyncPromise};
//!
//! let pool: Pool<u32, SyncPromise<u32>> = Pool::new(8);
//! let promise = pool.get();
//! promise.fulfill(1).unwrap();
//! assert!(pool.recycle(promise));
//!
//! let promise = pool.get();
//! assert!(!promise.is_resolved());
//! ```

use crate::{Options, Promise};
use parking_lot::Mutex;
use std::marker::PhantomData;
use tracing::trace;

pub struct Pool<T, P> {
    idle: Mutex<Vec<P>>,
    capacity: usize,
    _value: PhantomData<fn() -> T>,
}

impl<T, P> Pool<T, P> {
    pub fn new(capacity: usize) -> Self {
        Pool {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            _value: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of promises waiting to be handed out again.
    pub fn len(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.idle.lock().is_empty()
    }
}

impl<T, P> Pool<T, P>
where
    P: Promise<T> + Default,
{
    /// Hands out a promise in a fresh generation.
    pub fn get(&self) -> P {
        self.get_with_options(None)
    }

    pub fn get_with_options(&self, options: Option<Options>) -> P {
        // Pop before resetting so the pool lock is not held across it.
        let recycled = self.idle.lock().pop();
        match recycled {
            Some(promise) => {
                promise.reset_with_options(options);
                promise
            }
            None => {
                trace!("promise pool empty, allocating");
                let promise = P::default();
                if options.is_some() {
                    promise.reset_with_options(options);
                }
                promise
            }
        }
    }

    /// Takes back a resolved promise. Unresolved promises may still have
    /// waiters and are refused, as is anything beyond capacity; refused
    /// promises are closed and dropped.
    pub fn recycle(&self, promise: P) -> bool {
        if !promise.is_resolved() {
            trace!("refusing to pool an unresolved promise");
            promise.close();
            return false;
        }
        let mut idle = self.idle.lock();
        if idle.len() >= self.capacity {
            drop(idle);
            promise.close();
            return false;
        }
        idle.push(promise);
        true
    }
}

impl<T, P> Default for Pool<T, P> {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_POOL_CAPACITY)
    }
}
