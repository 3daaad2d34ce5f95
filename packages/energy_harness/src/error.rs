use std::error::Error as StdError;

use thiserror::Error;

use crate::PrepareError;

/// Errors that terminate a benchmark run.
///
/// Failures contained within a single iteration (a failing `execute()`) are not errors at this
/// level. They are reported through [`Step::Discarded`][crate::Step::Discarded] and counted in the
/// [`RunSummary`][crate::RunSummary].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The energy accounting subsystem could not be initialized. No iterations were attempted.
    #[error("energy probe unavailable: {0}")]
    ProbeUnavailable(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The payload could not prepare its state. Any state it had already prepared has been torn
    /// down.
    #[error("payload preparation failed: {0}")]
    AllocationFailure(#[from] PrepareError),
}

impl Error {
    /// A short name of the run stage that failed, for user-facing diagnostics.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ProbeUnavailable(_) => "probe",
            Self::AllocationFailure(_) => "prepare",
        }
    }
}

/// A specialized `Result` type for benchmark runs, returning the crate's [`Error`] type as the
/// error value.
pub type Result<T> = std::result::Result<T, Error>;
