use thiserror::Error;

/// Errors that can occur when constructing a kernel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No kernel has the given name.
    #[error("unknown kernel '{0}'")]
    UnknownKernel(String),

    /// A size parameter is outside the range the kernel can run with.
    #[error("invalid {parameter} for {kernel}: {problem}")]
    InvalidSize {
        /// Name of the kernel.
        kernel: &'static str,

        /// Name of the size parameter.
        parameter: &'static str,

        /// A human-readable description of the problem.
        problem: String,
    },
}

impl Error {
    pub(crate) fn invalid_size(
        kernel: &'static str,
        parameter: &'static str,
        problem: impl Into<String>,
    ) -> Self {
        Self::InvalidSize {
            kernel,
            parameter,
            problem: problem.into(),
        }
    }
}

/// Rejects a zero value for a size parameter that must be positive.
pub(crate) fn require_positive(
    kernel: &'static str,
    parameter: &'static str,
    value: usize,
) -> Result<usize> {
    if value == 0 {
        return Err(Error::invalid_size(kernel, parameter, "must be positive"));
    }

    Ok(value)
}

/// A specialized `Result` type for kernel construction, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn invalid_size_message() {
        let error = Error::invalid_size("n-body", "steps", "must be positive");

        assert_eq!(
            error.to_string(),
            "invalid steps for n-body: must be positive"
        );
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(require_positive("n-body", "steps", 0).is_err());
        assert_eq!(require_positive("n-body", "steps", 7).unwrap(), 7);
    }
}
