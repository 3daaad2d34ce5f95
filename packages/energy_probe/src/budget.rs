/// Name of the environment variable that conventionally carries the measurement budget.
pub const BUDGET_ENV_VAR: &str = "RAPL_ITERATIONS";

/// How many measurement windows a probe may open before it signals stop.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MeasurementBudget {
    limit: Option<u64>,
    opened: u64,
}

impl MeasurementBudget {
    /// A budget that never runs out. The run ends when the iteration policy is exhausted.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            limit: None,
            opened: 0,
        }
    }

    /// A budget of `windows` measurement windows.
    #[must_use]
    pub const fn limited(windows: u64) -> Self {
        Self {
            limit: Some(windows),
            opened: 0,
        }
    }

    /// The maximum number of windows, if there is one.
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// How many windows have been opened so far.
    #[must_use]
    pub const fn opened(&self) -> u64 {
        self.opened
    }

    /// Whether no further window may be opened.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.opened >= limit)
    }

    pub(crate) fn record_opened(&mut self) {
        self.opened = self
            .opened
            .checked_add(1)
            .expect("opening 2^64 measurement windows is an unrealistic scenario");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_is_never_exhausted() {
        let mut budget = MeasurementBudget::unlimited();

        for _ in 0..1000 {
            assert!(!budget.is_exhausted());
            budget.record_opened();
        }

        assert_eq!(budget.opened(), 1000);
        assert_eq!(budget.limit(), None);
    }

    #[test]
    fn limited_runs_out() {
        let mut budget = MeasurementBudget::limited(2);

        assert!(!budget.is_exhausted());
        budget.record_opened();
        assert!(!budget.is_exhausted());
        budget.record_opened();
        assert!(budget.is_exhausted());
    }

    #[test]
    fn zero_is_exhausted_immediately() {
        assert!(MeasurementBudget::limited(0).is_exhausted());
    }

    #[test]
    fn default_is_unlimited() {
        assert_eq!(MeasurementBudget::default(), MeasurementBudget::unlimited());
    }
}
