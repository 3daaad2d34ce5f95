use std::time::{Duration, Instant};

use energy_harness::{EnergyProbe, ProbeSignal};
use tracing::{debug, info};

use crate::MeasurementBudget;

/// Records the wall-clock duration of each measurement window.
///
/// This is the probe to use on machines without access to energy counters. It follows the
/// same window and budget rules as [`RaplProbe`][crate::RaplProbe], so a benchmark behaves
/// identically with either probe apart from what is recorded.
#[derive(Debug, Default)]
pub struct TimerProbe {
    budget: MeasurementBudget,
    opened_at: Option<Instant>,
    durations: Vec<Duration>,
}

impl TimerProbe {
    /// Creates a probe with the given measurement budget.
    #[must_use]
    pub fn new(budget: MeasurementBudget) -> Self {
        Self {
            budget,
            opened_at: None,
            durations: Vec::new(),
        }
    }

    /// The measurement budget and how much of it has been used.
    #[must_use]
    pub fn budget(&self) -> &MeasurementBudget {
        &self.budget
    }

    /// The duration of every window closed so far, oldest first.
    #[must_use]
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// The sum of all recorded window durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }
}

impl EnergyProbe for TimerProbe {
    fn begin_measurement(&mut self) -> ProbeSignal {
        assert!(
            self.opened_at.is_none(),
            "begin_measurement() called while a measurement window is already open"
        );

        if self.budget.is_exhausted() {
            info!(
                windows = self.budget.opened(),
                "measurement budget exhausted"
            );
            return ProbeSignal::Stop;
        }

        self.budget.record_opened();
        self.opened_at = Some(Instant::now());

        ProbeSignal::Continue
    }

    fn end_measurement(&mut self) {
        let opened_at = self
            .opened_at
            .take()
            .expect("end_measurement() called without an open measurement window");

        let duration = opened_at.elapsed();
        debug!(?duration, "measurement window closed");

        self.durations.push(duration);
    }
}
