use std::error::Error as StdError;

use tracing::error;

use crate::{
    EnergyProbe, Error, IterationController, IterationPolicy, Payload, Result, RunReport,
    RunSummary,
};

/// Ties a probe, a payload and a policy together for one benchmark run.
///
/// This is the outermost layer of a benchmark process. The process has already parsed its
/// configuration into an [`IterationPolicy`] and a payload. The harness opens the energy probe,
/// drives one [`IterationController`] to completion and forwards every report to the caller.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use energy_harness::{
///     EnergyProbe, ExecuteError, Harness, IterationPolicy, Payload, PrepareError, ProbeSignal,
/// };
///
/// #[derive(Debug)]
/// struct Unmetered;
///
/// impl EnergyProbe for Unmetered {
///     fn begin_measurement(&mut self) -> ProbeSignal {
///         ProbeSignal::Continue
///     }
///
///     fn end_measurement(&mut self) {}
/// }
///
/// #[derive(Debug)]
/// struct Answer;
///
/// impl Payload for Answer {
///     type State = ();
///     type Output = u32;
///
///     fn prepare(&mut self) -> Result<(), PrepareError> {
///         Ok(())
///     }
///
///     fn execute(&mut self, _: &mut ()) -> Result<u32, ExecuteError> {
///         Ok(42)
///     }
/// }
///
/// let harness = Harness::new(IterationPolicy::new(2));
///
/// let summary = harness
///     .run(|| Ok::<_, Infallible>(Unmetered), Answer, |report| println!("{report}"))
///     .unwrap();
///
/// assert_eq!(summary.reports_emitted(), 2);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Harness {
    policy: IterationPolicy,
}

impl Harness {
    /// Creates a harness that will run payloads according to `policy`.
    #[must_use]
    pub fn new(policy: IterationPolicy) -> Self {
        Self { policy }
    }

    /// The policy every run of this harness uses.
    #[must_use]
    pub fn policy(&self) -> &IterationPolicy {
        &self.policy
    }

    /// Opens the probe with `open_probe` and runs `payload` to completion, forwarding every
    /// report to `sink`.
    ///
    /// The probe is dropped (releasing the energy accounting subsystem) before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProbeUnavailable`] without executing anything if the probe cannot be
    /// opened. Returns [`Error::AllocationFailure`] if the payload cannot prepare its state.
    pub fn run<P, E, L>(
        &self,
        open_probe: impl FnOnce() -> std::result::Result<P, E>,
        payload: L,
        sink: impl FnMut(RunReport<L::Output>),
    ) -> Result<RunSummary>
    where
        P: EnergyProbe,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
        L: Payload,
    {
        let mut probe = open_probe().map_err(|e| {
            let cause = e.into();
            error!(%cause, "energy probe could not be opened");
            Error::ProbeUnavailable(cause)
        })?;

        self.run_with(&mut probe, payload, sink)
    }

    /// Runs `payload` to completion on an already opened probe, forwarding every report to
    /// `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if the payload cannot prepare its state.
    pub fn run_with<P, L>(
        &self,
        probe: &mut P,
        payload: L,
        sink: impl FnMut(RunReport<L::Output>),
    ) -> Result<RunSummary>
    where
        P: EnergyProbe + ?Sized,
        L: Payload,
    {
        IterationController::new(self.policy, probe, payload).run(sink)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::fakes::{RecordingProbe, ScriptedPayload};

    #[test]
    fn probe_failure_runs_nothing() {
        let harness = Harness::new(IterationPolicy::new(3));
        let mut reports = 0;

        let error = harness
            .run(
                || {
                    Err::<RecordingProbe, _>(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "cannot open /dev/cpu/0/msr",
                    ))
                },
                ScriptedPayload::counting(),
                |_| reports += 1,
            )
            .unwrap_err();

        assert!(matches!(error, Error::ProbeUnavailable(_)));
        assert_eq!(error.stage(), "probe");
        assert!(error.to_string().contains("/dev/cpu/0/msr"));
        assert_eq!(reports, 0);
    }

    #[test]
    fn forwards_reports_in_order() {
        let harness = Harness::new(IterationPolicy::new(3).with_warmup(1));
        let mut seen = Vec::new();

        let summary = harness
            .run(
                || Ok::<_, io::Error>(RecordingProbe::new()),
                ScriptedPayload::returning([0, 10, 20, 30]),
                |report| seen.push(report.into_payload_result()),
            )
            .unwrap();

        assert_eq!(seen, [10, 20, 30]);
        assert_eq!(summary.reports_emitted(), 3);
    }

    #[test]
    fn run_with_borrows_probe() {
        let harness = Harness::new(IterationPolicy::new(2));
        let mut probe = RecordingProbe::new();

        let _summary = harness
            .run_with(&mut probe, ScriptedPayload::counting(), |_| {})
            .unwrap();

        assert_eq!(probe.begin_count(), 2);
        assert!(probe.is_strictly_alternating());
    }
}
