use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use energy_harness::IterationPolicy;
use energy_kernels::KernelKind;
use energy_probe::{BUDGET_ENV_VAR, MeasurementBudget, SampleDestination};
use serde::Deserialize;
use thiserror::Error;

/// Repetitions used when neither the command line nor the configuration file sets them.
pub const DEFAULT_REPETITIONS: u64 = 10;

/// Which energy probe brackets the measured executions.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ProbeKind {
    /// RAPL energy counters.
    #[default]
    Rapl,

    /// Wall-clock durations only.
    Timer,
}

impl FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rapl" => Ok(Self::Rapl),
            "timer" => Ok(Self::Timer),
            _ => Err(format!("invalid probe '{s}', expected 'rapl' or 'timer'")),
        }
    }
}

/// Errors in the run configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    ReadFile {
        /// Path of the configuration file.
        path: PathBuf,

        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown or mistyped keys.
    #[error("cannot parse '{}': {source}", path.display())]
    ParseFile {
        /// Path of the configuration file.
        path: PathBuf,

        /// The underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// The measurement budget environment variable is not a non-negative integer.
    #[error("{variable} must be a non-negative integer, was '{value}'")]
    InvalidBudget {
        /// Name of the environment variable.
        variable: &'static str,

        /// The value that could not be parsed.
        value: String,

        /// The underlying error.
        #[source]
        source: ParseIntError,
    },

    /// The kernel was given a number of size values it does not take.
    #[error("{kernel} takes {expected} size value(s), got {actual}")]
    SizeCount {
        /// The kernel.
        kernel: KernelKind,

        /// How many size values the kernel accepts.
        expected: &'static str,

        /// How many were given.
        actual: usize,
    },

    /// The command kernel was selected without a command line.
    #[error("the command kernel needs a command line (--command or 'command' in the file)")]
    MissingCommand,
}

/// Contents of a TOML configuration file. Every key is optional.
///
/// ```toml
/// repetitions = 20
/// warmup = 3
/// reinitialize = true
/// probe = "timer"
/// sizes = [120, 120]
/// samples = "results/intel.csv"
/// max-measurements = 15
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
#[non_exhaustive]
pub struct FileConfig {
    /// Measured repetitions.
    pub repetitions: Option<u64>,

    /// Unmeasured warm-up repetitions.
    pub warmup: Option<u64>,

    /// Whether to prepare fresh state for every execution.
    pub reinitialize: Option<bool>,

    /// The probe to measure with.
    pub probe: Option<ProbeKind>,

    /// Kernel size values.
    pub sizes: Option<Vec<usize>>,

    /// Shell command line for the command kernel.
    pub command: Option<String>,

    /// File to append energy samples to.
    pub samples: Option<PathBuf>,

    /// Maximum number of measurement windows.
    pub max_measurements: Option<u64>,
}

impl FileConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line. They take precedence over the configuration file.
#[derive(Debug, Default)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain carrier of command line values, constructed field by field"
)]
pub struct CliOverrides {
    /// Measured repetitions.
    pub repetitions: Option<u64>,

    /// Unmeasured warm-up repetitions.
    pub warmup: Option<u64>,

    /// Set when `--reinitialize` was given.
    pub reinitialize: bool,

    /// The probe to measure with.
    pub probe: Option<ProbeKind>,

    /// Kernel size values. Empty when none were given.
    pub sizes: Vec<usize>,

    /// Shell command line for the command kernel.
    pub command: Option<String>,

    /// File to append energy samples to.
    pub samples: Option<PathBuf>,

    /// Maximum number of measurement windows.
    pub max_measurements: Option<u64>,
}

/// The fully resolved configuration of one benchmark run.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Settings {
    /// The kernel to run.
    pub kernel: KernelKind,

    /// Repetitions, warm-up and reinitialization.
    pub policy: IterationPolicy,

    /// The probe to measure with.
    pub probe: ProbeKind,

    /// Kernel size values, empty for kernel defaults.
    pub sizes: Vec<usize>,

    /// Shell command line for the command kernel.
    pub command: Option<String>,

    /// Where RAPL samples are written.
    pub samples: SampleDestination,

    /// How many measurement windows the probe may open.
    pub budget: MeasurementBudget,
}

impl Settings {
    /// Merges the command line over the configuration file over the defaults.
    ///
    /// `env_budget` is the value of the measurement budget environment variable, which is only
    /// consulted when neither the command line nor the file sets a budget.
    ///
    /// # Errors
    ///
    /// Fails if the budget has to come from `env_budget` and it is not a valid count.
    pub fn resolve(
        kernel: KernelKind,
        cli: CliOverrides,
        file: FileConfig,
        env_budget: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let repetitions = cli
            .repetitions
            .or(file.repetitions)
            .unwrap_or(DEFAULT_REPETITIONS);
        let warmup = cli.warmup.or(file.warmup).unwrap_or_default();
        let reinitialize = cli.reinitialize || file.reinitialize.unwrap_or_default();

        let policy = IterationPolicy::new(repetitions)
            .with_warmup(warmup)
            .reinitialize_per_iteration(reinitialize);

        let sizes = if cli.sizes.is_empty() {
            file.sizes.unwrap_or_default()
        } else {
            cli.sizes
        };

        let samples = cli
            .samples
            .or(file.samples)
            .map_or(SampleDestination::DefaultFile, SampleDestination::File);

        let budget = match cli.max_measurements.or(file.max_measurements) {
            Some(limit) => MeasurementBudget::limited(limit),
            None => budget_from_env(env_budget)?,
        };

        Ok(Self {
            kernel,
            policy,
            probe: cli.probe.or(file.probe).unwrap_or_default(),
            sizes,
            command: cli.command.or(file.command),
            samples,
            budget,
        })
    }
}

fn budget_from_env(value: Option<&str>) -> Result<MeasurementBudget, ConfigError> {
    let Some(value) = value else {
        return Ok(MeasurementBudget::unlimited());
    };

    value
        .trim()
        .parse()
        .map(MeasurementBudget::limited)
        .map_err(|source| ConfigError::InvalidBudget {
            variable: BUDGET_ENV_VAR,
            value: value.to_string(),
            source,
        })
}
