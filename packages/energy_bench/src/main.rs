#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Command line entry point for `energy_bench`. The logic lives in the library so it can be
//! tested without spawning the binary.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use energy_bench::{CliOverrides, ProbeKind, RunInput, init_logging, run};
use energy_probe::BUDGET_ENV_VAR;

/// Run a benchmark kernel under an energy probe, printing one line per measured iteration.
#[derive(FromArgs)]
struct Args {
    /// the kernel to run: polynomial-evaluation, matrix-multiplication, division-loop,
    /// binary-trees, n-body, spectral-norm, mandelbrot, fannkuch-redux or command
    #[argh(positional)]
    kernel: String,

    /// number of measured repetitions (default 10)
    #[argh(option)]
    repetitions: Option<u64>,

    /// number of unmeasured warm-up repetitions (default 0)
    #[argh(option)]
    warmup: Option<u64>,

    /// prepare fresh kernel state before every execution
    #[argh(switch)]
    reinitialize: bool,

    /// kernel size value; repeat for kernels that take several
    #[argh(option)]
    size: Vec<usize>,

    /// energy probe: rapl or timer (default rapl)
    #[argh(option)]
    probe: Option<ProbeKind>,

    /// file to append RAPL samples to (default <Vendor>_<units>.csv)
    #[argh(option)]
    samples: Option<PathBuf>,

    /// stop after this many measurement windows
    #[argh(option)]
    max_measurements: Option<u64>,

    /// TOML configuration file
    #[argh(option)]
    config: Option<PathBuf>,

    /// shell command line for the command kernel
    #[argh(option)]
    command: Option<String>,
}

#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    init_logging();

    let input = RunInput {
        kernel: args.kernel,
        cli: CliOverrides {
            repetitions: args.repetitions,
            warmup: args.warmup,
            reinitialize: args.reinitialize,
            probe: args.probe,
            sizes: args.size,
            command: args.command,
            samples: args.samples,
            max_measurements: args.max_measurements,
        },
        config_path: args.config,
        env_budget: std::env::var(BUDGET_ENV_VAR).ok(),
    };

    match run(input, &mut io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}: {e}", e.stage());
            ExitCode::FAILURE
        }
    }
}
