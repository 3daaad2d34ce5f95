use std::hint::black_box;

use tracing::{debug, error, info, warn};

use crate::{
    EnergyProbe, ExecuteError, IterationPolicy, MeasurementWindow, Payload, Result, RunReport,
    RunSummary, StopReason,
};

/// The lifecycle state of an [`IterationController`].
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ControllerState {
    /// Constructed, nothing has been executed yet.
    #[display("idle")]
    Idle,

    /// Executing unmeasured warm-up repetitions.
    #[display("warming up")]
    WarmingUp,

    /// Executing measured repetitions.
    #[display("measuring")]
    Measuring,

    /// Terminal. The controller cannot be used any more.
    #[display("stopped")]
    Stopped,
}

/// The unit of progress made by one call to [`IterationController::step()`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Step<T> {
    /// One unmeasured warm-up execution took place.
    WarmedUp {
        /// Ordinal of the warm-up execution, starting at 0.
        execution: u64,
    },

    /// One measured iteration completed.
    Report(RunReport<T>),

    /// One measured iteration failed. Its measurement window was closed and no report exists
    /// for it.
    Discarded {
        /// Ordinal of the discarded iteration.
        iteration_index: u64,

        /// What went wrong.
        error: ExecuteError,
    },

    /// The run is over and the controller is now [`ControllerState::Stopped`].
    Finished(RunSummary),
}

/// Drives a [`Payload`] through warm-up and measured repetitions, bracketing every measured
/// execution with exactly one measurement window on an [`EnergyProbe`].
///
/// A controller runs once. After it reaches [`ControllerState::Stopped`] it cannot be restarted;
/// construct a new one for a new run.
///
/// # Order of operations
///
/// 1. Unless the policy reinitializes per iteration, the payload is prepared once.
/// 2. Warm-up executions run without any measurement window and produce no reports.
/// 3. For every measured iteration:
///    1. If the policy reinitializes per iteration, fresh state is prepared.
///    2. A measurement window is opened. If the probe signals stop, the run ends here.
///    3. The payload executes.
///    4. The window is closed, whether the execution succeeded or not.
///    5. Per-iteration state, if any, is torn down.
///    6. A report is emitted if the execution succeeded.
/// 4. Any remaining state is torn down.
///
/// # Examples
///
/// ```
/// use energy_harness::{
///     EnergyProbe, ExecuteError, IterationController, IterationPolicy, Payload, PrepareError,
///     ProbeSignal,
/// };
///
/// #[derive(Debug)]
/// struct AlwaysContinue;
///
/// impl EnergyProbe for AlwaysContinue {
///     fn begin_measurement(&mut self) -> ProbeSignal {
///         ProbeSignal::Continue
///     }
///
///     fn end_measurement(&mut self) {}
/// }
///
/// #[derive(Debug)]
/// struct Triangle(u64);
///
/// impl Payload for Triangle {
///     type State = ();
///     type Output = u64;
///
///     fn prepare(&mut self) -> Result<(), PrepareError> {
///         Ok(())
///     }
///
///     fn execute(&mut self, _: &mut ()) -> Result<u64, ExecuteError> {
///         Ok((1..=self.0).sum())
///     }
/// }
///
/// let mut probe = AlwaysContinue;
/// let mut controller =
///     IterationController::new(IterationPolicy::new(3).with_warmup(1), &mut probe, Triangle(4));
///
/// let mut results = Vec::new();
/// let summary = controller
///     .run(|report| results.push(*report.payload_result()))
///     .unwrap();
///
/// assert_eq!(results, [10, 10, 10]);
/// assert_eq!(summary.reports_emitted(), 3);
/// assert_eq!(summary.warmup_executions(), 1);
/// ```
#[derive(derive_more::Debug)]
pub struct IterationController<'p, P, L>
where
    P: EnergyProbe + ?Sized,
    L: Payload,
{
    policy: IterationPolicy,
    probe: &'p mut P,

    /// Only `None` while `into_payload()` is consuming the controller.
    payload: Option<L>,

    state: ControllerState,

    #[debug(ignore)]
    prepared: Option<L::State>,

    warmup_executions: u64,
    next_iteration: u64,
    reports_emitted: u64,
    iterations_discarded: u64,
}

impl<'p, P, L> IterationController<'p, P, L>
where
    P: EnergyProbe + ?Sized,
    L: Payload,
{
    /// Creates a controller in the [`ControllerState::Idle`] state.
    ///
    /// The controller holds the probe exclusively for its whole lifetime, so no other window can
    /// be opened on it until the controller is dropped.
    #[must_use]
    pub fn new(policy: IterationPolicy, probe: &'p mut P, payload: L) -> Self {
        Self {
            policy,
            probe,
            payload: Some(payload),
            state: ControllerState::Idle,
            prepared: None,
            warmup_executions: 0,
            next_iteration: 0,
            reports_emitted: 0,
            iterations_discarded: 0,
        }
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The policy this controller was created with.
    #[must_use]
    pub fn policy(&self) -> &IterationPolicy {
        &self.policy
    }

    /// The payload being driven.
    #[must_use]
    pub fn payload(&self) -> &L {
        self.payload
            .as_ref()
            .expect("payload is present until the controller is consumed")
    }

    /// Consumes the controller, returning the payload.
    ///
    /// Any state still prepared (because the run was abandoned before it stopped) is torn down
    /// first.
    #[must_use]
    pub fn into_payload(mut self) -> L {
        self.teardown_prepared();
        self.payload
            .take()
            .expect("payload is present until the controller is consumed")
    }

    /// Executes the run to completion, handing every report to `sink` as soon as it exists.
    ///
    /// Returns a summary once the configured repetitions are exhausted or the probe signals stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails to prepare its state. The run is over in that case.
    ///
    /// # Panics
    ///
    /// Panics if the controller has already stopped.
    pub fn run(&mut self, mut sink: impl FnMut(RunReport<L::Output>)) -> Result<RunSummary> {
        loop {
            match self.step()? {
                Step::Report(report) => sink(report),
                Step::WarmedUp { .. } | Step::Discarded { .. } => {}
                Step::Finished(summary) => return Ok(summary),
            }
        }
    }

    /// Makes one unit of progress: one warm-up execution, one measured iteration or the final
    /// transition to [`ControllerState::Stopped`].
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails to prepare its state. The controller is stopped in
    /// that case.
    ///
    /// # Panics
    ///
    /// Panics if the controller has already stopped.
    pub fn step(&mut self) -> Result<Step<L::Output>> {
        match self.state {
            ControllerState::Idle => {
                self.start()?;
                self.step()
            }
            ControllerState::WarmingUp => self.warm_up_once(),
            ControllerState::Measuring => self.measure_once(),
            ControllerState::Stopped => {
                panic!("iteration controller used after it stopped - construct a new one per run")
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        info!(
            payload = ?self.payload(),
            repetitions = self.policy.repetitions(),
            warmup = self.policy.warmup_repetitions(),
            reinitialize = self.policy.reinitializes_per_iteration(),
            "starting benchmark run"
        );

        if !self.policy.reinitializes_per_iteration() {
            let state = self.prepare_state()?;
            self.prepared = Some(state);
        }

        self.state = if self.policy.warmup_repetitions() > 0 {
            ControllerState::WarmingUp
        } else {
            ControllerState::Measuring
        };

        Ok(())
    }

    fn warm_up_once(&mut self) -> Result<Step<L::Output>> {
        if self.policy.reinitializes_per_iteration() {
            let state = self.prepare_state()?;
            self.prepared = Some(state);
        }

        let state = self
            .prepared
            .as_mut()
            .expect("state is always prepared before an execution");

        let result = self
            .payload
            .as_mut()
            .expect("payload is present until the controller is consumed")
            .execute(state);

        if self.policy.reinitializes_per_iteration() {
            self.teardown_prepared();
        }

        let execution = self.warmup_executions;
        self.warmup_executions = execution
            .checked_add(1)
            .expect("warm-up execution count overflows u64");

        match result {
            Ok(output) => {
                black_box(output);
                debug!(execution, "warm-up execution completed");
            }
            Err(error) => warn!(execution, %error, "warm-up execution failed, ignoring"),
        }

        if self.warmup_executions >= self.policy.warmup_repetitions() {
            debug!("warm-up complete, starting measurement");
            self.state = ControllerState::Measuring;
        }

        Ok(Step::WarmedUp { execution })
    }

    fn measure_once(&mut self) -> Result<Step<L::Output>> {
        if self.next_iteration >= self.policy.repetitions() {
            return Ok(Step::Finished(self.finish(StopReason::Exhausted)));
        }

        let iteration_index = self.next_iteration;

        if self.policy.reinitializes_per_iteration() {
            let state = self.prepare_state()?;
            self.prepared = Some(state);
        }

        let state = self
            .prepared
            .as_mut()
            .expect("state is always prepared before an execution");

        let payload = self
            .payload
            .as_mut()
            .expect("payload is present until the controller is consumed");

        let Some(result) = execute_measured(&mut *self.probe, payload, state) else {
            info!(iteration_index, "energy probe signalled stop");
            return Ok(Step::Finished(self.finish(StopReason::ProbeStopped)));
        };

        self.next_iteration = iteration_index
            .checked_add(1)
            .expect("iteration count overflows u64 - this indicates an unrealistic scenario");

        if self.policy.reinitializes_per_iteration() {
            self.teardown_prepared();
        }

        match result {
            Ok(output) => {
                self.reports_emitted = self
                    .reports_emitted
                    .checked_add(1)
                    .expect("guarded by iteration count not overflowing");

                debug!(iteration_index, "measured iteration completed");

                Ok(Step::Report(RunReport::measured(iteration_index, black_box(output))))
            }
            Err(error) => {
                self.iterations_discarded = self
                    .iterations_discarded
                    .checked_add(1)
                    .expect("guarded by iteration count not overflowing");

                warn!(
                    iteration_index,
                    %error,
                    "payload execution failed, discarding measured iteration"
                );

                Ok(Step::Discarded {
                    iteration_index,
                    error,
                })
            }
        }
    }

    fn prepare_state(&mut self) -> Result<L::State> {
        match self.payload_mut().prepare() {
            Ok(state) => Ok(state),
            Err(error) => {
                error!(%error, "payload preparation failed, aborting run");

                self.teardown_prepared();
                self.state = ControllerState::Stopped;

                Err(error.into())
            }
        }
    }

    fn teardown_prepared(&mut self) {
        if let Some(state) = self.prepared.take() {
            self.payload_mut().teardown(state);
        }
    }

    fn payload_mut(&mut self) -> &mut L {
        self.payload
            .as_mut()
            .expect("payload is present until the controller is consumed")
    }

    fn finish(&mut self, stop_reason: StopReason) -> RunSummary {
        self.teardown_prepared();
        self.state = ControllerState::Stopped;

        let summary = RunSummary::new(
            self.reports_emitted,
            self.iterations_discarded,
            self.warmup_executions,
            stop_reason,
        );

        info!(%summary, "benchmark run finished");

        summary
    }
}

/// Tears down state left prepared by a run that was abandoned before it stopped, including
/// one unwound by a panic in the payload or the report sink.
impl<P, L> Drop for IterationController<'_, P, L>
where
    P: EnergyProbe + ?Sized,
    L: Payload,
{
    fn drop(&mut self) {
        if let Some(state) = self.prepared.take() {
            if let Some(payload) = self.payload.as_mut() {
                payload.teardown(state);
            }
        }
    }
}

/// Executes the payload once inside a measurement window.
///
/// Returns `None` without executing anything if the probe signals stop. Otherwise the window is
/// closed before this returns, whatever the outcome of the execution.
fn execute_measured<P, L>(
    probe: &mut P,
    payload: &mut L,
    state: &mut L::State,
) -> Option<std::result::Result<L::Output, ExecuteError>>
where
    P: EnergyProbe + ?Sized,
    L: Payload,
{
    let window = MeasurementWindow::open(probe)?;
    let result = payload.execute(state);
    window.close();

    Some(result)
}
