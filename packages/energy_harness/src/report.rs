use std::fmt;

/// The record of one completed measured iteration.
///
/// Reports are created by the [`IterationController`][crate::IterationController] and handed
/// to the caller's sink immediately. They are never modified afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunReport<T> {
    iteration_index: u64,
    was_measured: bool,
    payload_result: T,
}

impl<T> RunReport<T> {
    pub(crate) const fn measured(iteration_index: u64, payload_result: T) -> Self {
        Self {
            iteration_index,
            was_measured: true,
            payload_result,
        }
    }

    /// The ordinal of the measured iteration, starting at 0.
    ///
    /// This counts iterations attempted by the controller, not reports emitted, so discarded
    /// iterations leave gaps.
    #[must_use]
    pub const fn iteration_index(&self) -> u64 {
        self.iteration_index
    }

    /// Whether the execution was bracketed by a measurement window.
    #[must_use]
    pub const fn was_measured(&self) -> bool {
        self.was_measured
    }

    /// The value returned by the payload.
    #[must_use]
    pub const fn payload_result(&self) -> &T {
        &self.payload_result
    }

    /// Takes the value returned by the payload, consuming the report.
    #[must_use]
    pub fn into_payload_result(self) -> T {
        self.payload_result
    }
}

impl<T> fmt::Display for RunReport<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.iteration_index, self.payload_result)
    }
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum StopReason {
    /// All configured repetitions were attempted.
    #[display("repetitions exhausted")]
    Exhausted,

    /// The energy probe signalled that no more measurements should be taken.
    #[display("probe signalled stop")]
    ProbeStopped,
}

/// The outcome of a completed run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use = "the summary says whether the run ended early or discarded iterations"]
pub struct RunSummary {
    reports_emitted: u64,
    iterations_discarded: u64,
    warmup_executions: u64,
    stop_reason: StopReason,
}

impl RunSummary {
    pub(crate) const fn new(
        reports_emitted: u64,
        iterations_discarded: u64,
        warmup_executions: u64,
        stop_reason: StopReason,
    ) -> Self {
        Self {
            reports_emitted,
            iterations_discarded,
            warmup_executions,
            stop_reason,
        }
    }

    /// How many [`RunReport`]s were handed to the sink.
    #[must_use]
    pub const fn reports_emitted(&self) -> u64 {
        self.reports_emitted
    }

    /// How many measured iterations were discarded because the payload failed.
    #[must_use]
    pub const fn iterations_discarded(&self) -> u64 {
        self.iterations_discarded
    }

    /// How many unmeasured warm-up executions took place.
    #[must_use]
    pub const fn warmup_executions(&self) -> u64 {
        self.warmup_executions
    }

    /// Why the run ended.
    #[must_use]
    pub const fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reports, {} discarded, {} warm-up executions ({})",
            self.reports_emitted,
            self.iterations_discarded,
            self.warmup_executions,
            self.stop_reason
        )
    }
}
