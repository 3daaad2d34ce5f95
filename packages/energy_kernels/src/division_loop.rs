use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Error, Result};

/// Finds the smallest `n` whose harmonic number `1 + 1/2 + ... + 1/n` reaches `m`.
///
/// The work grows exponentially with `m`: roughly `e^(m - 0.58)` floating point divisions.
#[derive(Debug)]
pub struct DivisionLoop {
    m: u32,
}

impl DivisionLoop {
    /// Name of the kernel.
    pub const NAME: &str = "division-loop";

    /// Default harmonic target.
    pub const DEFAULT_M: usize = 22;

    /// Creates the kernel for harmonic target `m`.
    ///
    /// # Errors
    ///
    /// Fails if `m` is zero or too large to ever be reached with 64-bit floating point.
    pub fn new(m: usize) -> Result<Self> {
        // Beyond this the increments vanish below f64 precision before the sum gets there.
        const MAX_M: u32 = 32;

        match u32::try_from(m) {
            Ok(m @ 1..=MAX_M) => Ok(Self { m }),
            _ => Err(Error::invalid_size(
                Self::NAME,
                "m",
                format!("must be between 1 and {MAX_M}, was {m}"),
            )),
        }
    }
}

impl Payload for DivisionLoop {
    type State = ();
    type Output = u64;

    fn prepare(&mut self) -> std::result::Result<(), PrepareError> {
        Ok(())
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::arithmetic_side_effects,
        reason = "n stays far below 2^52 for every accepted m"
    )]
    fn execute(&mut self, _: &mut ()) -> std::result::Result<u64, ExecuteError> {
        let target = f64::from(self.m);
        let mut sum = 0.0;
        let mut n = 0_u64;

        while sum < target {
            n += 1;
            sum += 1.0 / n as f64;
        }

        Ok(n)
    }
}
