/*!
 * Promise Configuration
 *
 * Backend selection and defaults applied to the promises a config builds.
 */

use crate::pool::Pool;
use crate::{ChannelPromise, Options, Promise, SyncPromise, WaitGroupPromise};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Synchronization backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Channel closed on resolution
    #[default]
    Channel,
    /// Mutex and condvar broadcast
    Condvar,
    /// Counting wait group
    WaitGroup,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Channel, Strategy::Condvar, Strategy::WaitGroup];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Channel => "channel",
            Strategy::Condvar => "condvar",
            Strategy::WaitGroup => "waitgroup",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown promise strategy: {0}")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" | "chan" => Ok(Strategy::Channel),
            "condvar" | "sync" => Ok(Strategy::Condvar),
            "waitgroup" | "wait_group" | "wg" => Ok(Strategy::WaitGroup),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Promise construction settings
#[derive(Debug, Clone)]
pub struct PromiseConfig {
    pub strategy: Strategy,
    /// Applied with `set_timeout` to every promise built
    pub default_timeout: Option<Duration>,
    pub pool_capacity: usize,
}

impl Default for PromiseConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            default_timeout: None,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl PromiseConfig {
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn build<T>(&self) -> Box<dyn Promise<T>>
    where
        T: Clone + Send + 'static,
    {
        self.build_with_options(None)
    }

    pub fn build_with_options<T>(&self, options: Option<Options>) -> Box<dyn Promise<T>>
    where
        T: Clone + Send + 'static,
    {
        let promise: Box<dyn Promise<T>> = match (self.strategy, options) {
            (Strategy::Channel, None) => Box::new(ChannelPromise::new()),
            (Strategy::Channel, Some(options)) => Box::new(ChannelPromise::with_options(options)),
            (Strategy::Condvar, None) => Box::new(SyncPromise::new()),
            (Strategy::Condvar, Some(options)) => Box::new(SyncPromise::with_options(options)),
            (Strategy::WaitGroup, None) => Box::new(WaitGroupPromise::new()),
            (Strategy::WaitGroup, Some(options)) => {
                Box::new(WaitGroupPromise::with_options(options))
            }
        };
        if let Some(timeout) = self.default_timeout {
            promise.set_timeout(timeout);
        }
        promise
    }

    pub fn pool<T, P>(&self) -> Pool<T, P> {
        Pool::new(self.pool_capacity)
    }
}
