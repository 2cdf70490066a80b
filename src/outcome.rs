use crate::Error;

/// The result shapes a promise can be resolved with.
///
/// # Examples
///
/// ```
/// use promise_kit::{Error, Outcome, Promise};
///
/// let promise = promise_kit::new::<&str>();
/// promise.resolve(Outcome::ValueAndError(Some("partial"), Some(Error::msg("truncated")))).unwrap();
/// assert_eq!(promise.value(), Some("partial"));
/// assert_eq!(promise.error(), Some(Error::msg("truncated")));
/// ```
#[derive(Debug, Clone, Default)]
pub enum Outcome<T> {
    /// Settles the promise without recording anything.
    #[default]
    Empty,
    Value(T),
    ValueAndError(Option<T>, Option<Error>),
}

impl<T> Outcome<T> {
    pub fn error(err: Error) -> Self {
        Outcome::ValueAndError(None, Some(err))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub(crate) fn reset() -> Self {
        Outcome::error(Error::Reset)
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(err) => Outcome::error(err),
        }
    }
}

/// What a generation settled with, as handed to waiters.
#[derive(Debug, Clone)]
pub(crate) struct Settled<T> {
    pub(crate) value: Option<T>,
    pub(crate) error: Option<Error>,
}

impl<T> Settled<T> {
    pub(crate) fn reset() -> Self {
        Settled {
            value: None,
            error: Some(Error::Reset),
        }
    }

    pub(crate) fn is_reset(&self) -> bool {
        self.error.as_ref().is_some_and(Error::is_reset)
    }

    pub(crate) fn into_parts(self) -> (Option<T>, Option<Error>) {
        (self.value, self.error)
    }
}

impl<T> From<Outcome<T>> for Settled<T> {
    fn from(outcome: Outcome<T>) -> Self {
        let (value, error) = match outcome {
            Outcome::Empty => (None, None),
            Outcome::Value(value) => (Some(value), None),
            Outcome::ValueAndError(value, error) => (value, error),
        };
        Settled { value, error }
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Settled};
    use crate::Error;

    #[test]
    fn test_result_conversion() {
        let settled: Settled<u8> = Outcome::from(Ok(7)).into();
        assert_eq!(settled.into_parts(), (Some(7), None));

        let settled: Settled<u8> = Outcome::from(Err(Error::msg("nope"))).into();
        assert_eq!(settled.into_parts(), (None, Some(Error::msg("nope"))));
    }

    #[test]
    fn test_reset_marker() {
        assert!(Settled::<u8>::from(Outcome::reset()).is_reset());
        assert!(!Settled::<u8>::from(Outcome::Empty).is_reset());
        assert!(Outcome::<u8>::default().is_empty());
    }
}
