#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Runs a benchmark kernel under an energy probe.
//!
//! This crate provides the logic of the `energy_bench` tool, exposed via the [`run`] function.
//! The binary entry point is in `main.rs`.
//!
//! ```text
//! energy_bench n-body --repetitions 20 --warmup 3 --size 5000
//! energy_bench mandelbrot --probe timer --reinitialize
//! energy_bench command --command "python3 fib.py 30" --max-measurements 5
//! ```
//!
//! Configuration comes from, in decreasing order of precedence: the command line, a TOML file
//! given with `--config`, and built-in defaults. The `RAPL_ITERATIONS` environment variable
//! sets the measurement budget when neither of the others does.
//!
//! Every completed measured iteration prints one `<index>: <result>` line on stdout. Logs go to
//! stderr and are filtered with `RUST_LOG`.

mod config;
mod dispatch;
mod error;
mod logging;

use std::io::Write;
use std::path::PathBuf;

pub use config::*;
use dispatch::run_kernel;
use energy_harness::RunSummary;
use energy_kernels::KernelKind;
pub use error::*;
pub use logging::*;
use tracing::debug;

/// Input of one run, as gathered by the binary from its process environment.
#[doc(hidden)]
#[derive(Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "This is a hidden struct for internal/test use only"
)]
pub struct RunInput {
    /// Name of the kernel to run.
    pub kernel: String,

    /// Values given on the command line.
    pub cli: CliOverrides,

    /// Path of the configuration file, if one was given.
    pub config_path: Option<PathBuf>,

    /// Value of the measurement budget environment variable, if set.
    pub env_budget: Option<String>,
}

/// Core logic of the tool, extracted for testability.
///
/// Resolves the configuration, runs the kernel and writes one line per report to `out`.
///
/// # Errors
///
/// Fails if the configuration or kernel sizes are invalid, the probe cannot be opened, the
/// kernel cannot prepare its state, or reports cannot be written. [`RunError::stage()`] names
/// which of these it was.
#[doc(hidden)]
pub fn run(input: RunInput, out: &mut dyn Write) -> Result<RunSummary, RunError> {
    let kernel: KernelKind = input.kernel.parse()?;

    let file = match &input.config_path {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let settings = Settings::resolve(kernel, input.cli, file, input.env_budget.as_deref())?;
    debug!(?settings, "configuration resolved");

    run_kernel(&settings, out)
}
