use std::fmt::Display;
use std::io::Write;

use energy_harness::{EnergyProbe, Error as HarnessError, Harness, Payload, RunSummary};
use energy_kernels::{
    BinaryTrees, DivisionLoop, Error as KernelError, FannkuchRedux, KernelKind, Mandelbrot,
    MatrixMultiplication, NBody, PolynomialEvaluation, ShellCommand, SpectralNorm,
};
use energy_probe::{Domain, RaplOptions, RaplProbe, TimerProbe};
use tracing::info;

use crate::{ConfigError, ProbeKind, RunError, Settings};

/// Size values given for one kernel, checked against how many it takes.
struct Sizes<'a> {
    kernel: KernelKind,
    values: &'a [usize],
}

impl Sizes<'_> {
    fn single(&self, default: usize) -> Result<usize, ConfigError> {
        match self.values {
            [] => Ok(default),
            [value] => Ok(*value),
            _ => Err(self.count_error("1")),
        }
    }

    /// Two values, or one value used for both.
    fn pair(&self, default: (usize, usize)) -> Result<(usize, usize), ConfigError> {
        match self.values {
            [] => Ok(default),
            [value] => Ok((*value, *value)),
            [first, second] => Ok((*first, *second)),
            _ => Err(self.count_error("1 or 2")),
        }
    }

    fn none(&self) -> Result<(), ConfigError> {
        if self.values.is_empty() {
            Ok(())
        } else {
            Err(self.count_error("0"))
        }
    }

    fn count_error(&self, expected: &'static str) -> ConfigError {
        ConfigError::SizeCount {
            kernel: self.kernel,
            expected,
            actual: self.values.len(),
        }
    }
}

/// Constructs the configured kernel and runs it, writing one line per report to `out`.
pub(crate) fn run_kernel(settings: &Settings, out: &mut dyn Write) -> Result<RunSummary, RunError> {
    let sizes = Sizes {
        kernel: settings.kernel,
        values: &settings.sizes,
    };

    match settings.kernel {
        KernelKind::PolynomialEvaluation => {
            let n = sizes.single(PolynomialEvaluation::DEFAULT_N)?;
            with_probe(settings, PolynomialEvaluation::new(n)?, out)
        }
        KernelKind::MatrixMultiplication => {
            let (rows, cols) = sizes.pair((
                MatrixMultiplication::DEFAULT_ROWS,
                MatrixMultiplication::DEFAULT_COLS,
            ))?;
            with_probe(settings, MatrixMultiplication::new(rows, cols)?, out)
        }
        KernelKind::DivisionLoop => {
            let m = sizes.single(DivisionLoop::DEFAULT_M)?;
            with_probe(settings, DivisionLoop::new(m)?, out)
        }
        KernelKind::BinaryTrees => {
            let depth = sizes.single(BinaryTrees::DEFAULT_MAX_DEPTH)?;
            with_probe(settings, BinaryTrees::new(depth)?, out)
        }
        KernelKind::NBody => {
            let steps = sizes.single(NBody::DEFAULT_STEPS)?;
            with_probe(settings, NBody::new(steps)?, out)
        }
        KernelKind::SpectralNorm => {
            let n = sizes.single(SpectralNorm::DEFAULT_N)?;
            with_probe(settings, SpectralNorm::new(n)?, out)
        }
        KernelKind::Mandelbrot => {
            let size = sizes.single(Mandelbrot::DEFAULT_SIZE)?;
            with_probe(settings, Mandelbrot::new(size)?, out)
        }
        KernelKind::FannkuchRedux => {
            let n = sizes.single(FannkuchRedux::DEFAULT_N)?;
            with_probe(settings, FannkuchRedux::new(n)?, out)
        }
        KernelKind::Command => {
            sizes.none()?;
            let command = settings
                .command
                .as_deref()
                .ok_or(ConfigError::MissingCommand)?;
            with_probe(settings, ShellCommand::new(command)?, out)
        }
        other => Err(KernelError::UnknownKernel(other.to_string()).into()),
    }
}

/// Opens the configured probe and runs `payload` under it.
fn with_probe<L>(
    settings: &Settings,
    payload: L,
    out: &mut dyn Write,
) -> Result<RunSummary, RunError>
where
    L: Payload,
    L::Output: Display,
{
    match settings.probe {
        ProbeKind::Rapl => {
            let options = RaplOptions::new()
                .budget(settings.budget)
                .samples(settings.samples.clone());

            let mut probe = RaplProbe::open(options)
                .map_err(|e| HarnessError::ProbeUnavailable(Box::new(e)))?;

            let summary = measure(settings, &mut probe, payload, out)?;

            let package_joules: f64 = probe
                .samples()
                .iter()
                .filter_map(|sample| sample.joules(Domain::Package))
                .sum();
            info!(
                samples = probe.samples().len(),
                package_joules, "energy measured"
            );

            Ok(summary)
        }
        ProbeKind::Timer => {
            let mut probe = TimerProbe::new(settings.budget);

            let summary = measure(settings, &mut probe, payload, out)?;

            info!(
                windows = probe.durations().len(),
                total = ?probe.total(),
                "time measured"
            );

            Ok(summary)
        }
    }
}

/// Drives one run, printing every report as `<index>: <result>`.
fn measure<P, L>(
    settings: &Settings,
    probe: &mut P,
    payload: L,
    out: &mut dyn Write,
) -> Result<RunSummary, RunError>
where
    P: EnergyProbe,
    L: Payload,
    L::Output: Display,
{
    let mut write_error = None;

    let summary = Harness::new(settings.policy).run_with(probe, payload, |report| {
        if write_error.is_none() {
            if let Err(e) = writeln!(out, "{report}") {
                write_error = Some(e);
            }
        }
    })?;

    if let Some(e) = write_error {
        return Err(RunError::Output(e));
    }

    out.flush().map_err(RunError::Output)?;

    info!(%summary, "run finished");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(values: &[usize]) -> Sizes<'_> {
        Sizes {
            kernel: KernelKind::MatrixMultiplication,
            values,
        }
    }

    #[test]
    fn single_size() {
        assert_eq!(sizes(&[]).single(5).unwrap(), 5);
        assert_eq!(sizes(&[9]).single(5).unwrap(), 9);
        assert!(sizes(&[1, 2]).single(5).is_err());
    }

    #[test]
    fn pair_of_sizes() {
        assert_eq!(sizes(&[]).pair((2, 3)).unwrap(), (2, 3));
        assert_eq!(sizes(&[4]).pair((2, 3)).unwrap(), (4, 4));
        assert_eq!(sizes(&[4, 5]).pair((2, 3)).unwrap(), (4, 5));

        let error = sizes(&[1, 2, 3]).pair((2, 3)).unwrap_err();
        assert_eq!(
            error.to_string(),
            "matrix-multiplication takes 1 or 2 size value(s), got 3"
        );
    }

    #[test]
    fn no_sizes() {
        assert!(sizes(&[]).none().is_ok());
        assert!(sizes(&[1]).none().is_err());
    }
}
