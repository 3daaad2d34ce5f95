use std::io;

use thiserror::Error;

use crate::ConfigError;

/// Errors that end a benchmark run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The kernel could not be constructed with the configured sizes.
    #[error(transparent)]
    Kernel(#[from] energy_kernels::Error),

    /// The probe could not be opened or the payload could not prepare its state.
    #[error(transparent)]
    Harness(#[from] energy_harness::Error),

    /// Reports could not be written.
    #[error("cannot write reports: {0}")]
    Output(#[source] io::Error),
}

impl RunError {
    /// The stage of the run that failed, for the one-line failure message.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Kernel(_) => "kernel",
            Self::Harness(e) => e.stage(),
            Self::Output(_) => "output",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(RunError: Send, Sync, Debug);

    #[test]
    fn stages() {
        let config = RunError::from(ConfigError::MissingCommand);
        assert_eq!(config.stage(), "config");

        let kernel = RunError::from(energy_kernels::Error::UnknownKernel("x".to_string()));
        assert_eq!(kernel.stage(), "kernel");

        let probe = RunError::from(energy_harness::Error::ProbeUnavailable("no msr".into()));
        assert_eq!(probe.stage(), "probe");
        assert_eq!(probe.to_string(), "energy probe unavailable: no msr");

        let output = RunError::Output(io::Error::other("closed"));
        assert_eq!(output.stage(), "output");
    }
}
