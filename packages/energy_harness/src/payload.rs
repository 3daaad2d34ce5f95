use std::error::Error as StdError;
use std::fmt::Debug;

use thiserror::Error;

/// A swappable unit of benchmark work, driven through its lifecycle by an
/// [`IterationController`][crate::IterationController].
///
/// The lifecycle of one prepared state is `prepare()` → any number of `execute()` → `teardown()`.
/// Whether a fresh state is prepared for every execution or once for the whole run is decided by
/// the [`IterationPolicy`][crate::IterationPolicy], not by the payload.
///
/// Anything `execute()` needs beyond its own configuration lives in [`State`][Self::State], which
/// is owned by the controller between `prepare()` and `teardown()`. There is no process-wide
/// mutable state involved.
///
/// # Examples
///
/// ```
/// use energy_harness::{ExecuteError, Payload, PrepareError};
///
/// #[derive(Debug)]
/// struct SumOfSquares {
///     n: u64,
/// }
///
/// impl Payload for SumOfSquares {
///     type State = Vec<u64>;
///     type Output = u64;
///
///     fn prepare(&mut self) -> Result<Self::State, PrepareError> {
///         Ok((1..=self.n).collect())
///     }
///
///     fn execute(&mut self, values: &mut Self::State) -> Result<Self::Output, ExecuteError> {
///         Ok(values.iter().map(|v| v * v).sum())
///     }
/// }
/// ```
pub trait Payload: Debug {
    /// State established by `prepare()` and consumed by `teardown()`.
    type State;

    /// The opaque result of one execution.
    ///
    /// The harness never interprets it. It exists so that the computation cannot be optimized
    /// away and so the caller has something to print.
    type Output;

    /// Establishes the state that `execute()` needs (allocations, precomputed tables).
    ///
    /// # Errors
    ///
    /// A failure here is fatal to the whole run.
    fn prepare(&mut self) -> Result<Self::State, PrepareError>;

    /// Performs the work being measured.
    ///
    /// Any threads started by this method must be joined before it returns, as the measurement
    /// window is closed as soon as it does.
    ///
    /// # Errors
    ///
    /// A failure here invalidates the measurement. The iteration is discarded and the run
    /// continues with the next iteration.
    fn execute(&mut self, state: &mut Self::State) -> Result<Self::Output, ExecuteError>;

    /// Releases the state created by `prepare()`.
    ///
    /// The default implementation simply drops the state.
    fn teardown(&mut self, state: Self::State) {
        drop(state);
    }
}

/// The payload could not establish the state it needs to execute.
#[derive(Debug, Error)]
#[error("allocation failure in {payload}: {reason}")]
pub struct PrepareError {
    payload: String,
    reason: String,
}

impl PrepareError {
    /// Creates an allocation failure for the named payload.
    #[must_use]
    pub fn allocation_failure(payload: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            reason: reason.into(),
        }
    }

    /// The name of the payload that failed to prepare.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// A human-readable description of what could not be allocated.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// One execution of a payload failed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecuteError {
    message: String,

    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ExecuteError {
    /// Creates an execution failure with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an execution failure caused by another error.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The human-readable message, without the source chain.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(PrepareError: Send, Sync, Debug);
    assert_impl_all!(ExecuteError: Send, Sync, Debug);

    #[derive(Debug)]
    struct Doubler {
        teardowns: usize,
    }

    impl Payload for Doubler {
        type State = u32;
        type Output = u32;

        fn prepare(&mut self) -> Result<Self::State, PrepareError> {
            Ok(21)
        }

        fn execute(&mut self, state: &mut Self::State) -> Result<Self::Output, ExecuteError> {
            Ok(*state * 2)
        }

        fn teardown(&mut self, state: Self::State) {
            assert_eq!(state, 21);
            self.teardowns += 1;
        }
    }

    #[test]
    fn lifecycle_round_trip() {
        let mut payload = Doubler { teardowns: 0 };

        let mut state = payload.prepare().unwrap();
        assert_eq!(payload.execute(&mut state).unwrap(), 42);
        payload.teardown(state);

        assert_eq!(payload.teardowns, 1);
    }

    #[test]
    fn prepare_error_describes_payload() {
        let error = PrepareError::allocation_failure("matrix", "10 GiB requested");

        assert_eq!(error.payload(), "matrix");
        assert_eq!(error.reason(), "10 GiB requested");
        assert_eq!(
            error.to_string(),
            "allocation failure in matrix: 10 GiB requested"
        );
    }

    #[test]
    fn execute_error_keeps_source() {
        let error = ExecuteError::with_source(
            "command could not be started",
            io::Error::new(io::ErrorKind::NotFound, "sh missing"),
        );

        assert_eq!(error.message(), "command could not be started");
        assert_eq!(
            error.source().map(ToString::to_string).as_deref(),
            Some("sh missing")
        );
    }

    #[test]
    fn execute_error_without_source() {
        let error = ExecuteError::new("bad input");

        assert_eq!(error.to_string(), "bad input");
        assert!(error.source().is_none());
    }
}
