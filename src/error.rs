use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced by promise operations.
///
/// Every variant is a plain returned value. A losing [`resolve`] is reported as
/// [`Error::AlreadyResolved`] and is not an application error: somebody else
/// settled the promise first.
///
/// [`resolve`]: crate::Promise::resolve
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("resolved already")]
    AlreadyResolved,
    #[error("timeout not set")]
    NoDeadlineSet,
    #[error("timeout")]
    DeadlineElapsed,
    #[error("promise reset")]
    Reset,
    #[error("not implemented")]
    NotImplemented,
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Rejected(Arc<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Wraps a caller error so it can be recorded as a resolution error.
    pub fn rejected<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Rejected(Arc::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Error::Reset)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Message(a), Error::Message(b)) => a == b,
            (Error::Rejected(a), Error::Rejected(b)) => Arc::ptr_eq(a, b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}
