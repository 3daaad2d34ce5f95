/// How many times a payload is executed and how its state is managed between executions.
///
/// The policy is immutable once built. A fresh [`IterationController`][crate::IterationController]
/// is constructed for every run.
///
/// # Examples
///
/// ```
/// use energy_harness::IterationPolicy;
///
/// let policy = IterationPolicy::new(10)
///     .with_warmup(3)
///     .reinitialize_per_iteration(true);
///
/// assert_eq!(policy.repetitions(), 10);
/// assert_eq!(policy.warmup_repetitions(), 3);
/// assert!(policy.reinitializes_per_iteration());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[must_use]
pub struct IterationPolicy {
    repetitions: u64,
    warmup_repetitions: u64,
    reinitialize_per_iteration: bool,
}

impl IterationPolicy {
    /// Creates a policy with `repetitions` measured iterations, no warm-up and state prepared
    /// once for the whole run.
    pub const fn new(repetitions: u64) -> Self {
        Self {
            repetitions,
            warmup_repetitions: 0,
            reinitialize_per_iteration: false,
        }
    }

    /// Runs the payload `count` times before measurement starts, without measuring and without
    /// reporting the results.
    pub const fn with_warmup(self, count: u64) -> Self {
        Self {
            warmup_repetitions: count,
            ..self
        }
    }

    /// Whether to prepare fresh payload state before every execution (tearing down the previous
    /// state first) instead of once for the whole run.
    pub const fn reinitialize_per_iteration(self, value: bool) -> Self {
        Self {
            reinitialize_per_iteration: value,
            ..self
        }
    }

    /// The maximum number of measured iterations.
    #[must_use]
    pub const fn repetitions(&self) -> u64 {
        self.repetitions
    }

    /// The number of unmeasured executions that precede measurement.
    #[must_use]
    pub const fn warmup_repetitions(&self) -> u64 {
        self.warmup_repetitions
    }

    /// Whether payload state is prepared fresh for every execution.
    #[must_use]
    pub const fn reinitializes_per_iteration(&self) -> bool {
        self.reinitialize_per_iteration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = IterationPolicy::new(5);

        assert_eq!(policy.repetitions(), 5);
        assert_eq!(policy.warmup_repetitions(), 0);
        assert!(!policy.reinitializes_per_iteration());
    }

    #[test]
    fn builder_methods_do_not_disturb_each_other() {
        let policy = IterationPolicy::new(7)
            .reinitialize_per_iteration(true)
            .with_warmup(2);

        assert_eq!(policy.repetitions(), 7);
        assert_eq!(policy.warmup_repetitions(), 2);
        assert!(policy.reinitializes_per_iteration());

        let policy = policy.reinitialize_per_iteration(false);
        assert_eq!(policy.warmup_repetitions(), 2);
        assert!(!policy.reinitializes_per_iteration());
    }

    #[test]
    fn zero_repetitions_is_valid() {
        let policy = IterationPolicy::new(0);
        assert_eq!(policy.repetitions(), 0);
    }
}
