use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Error, Result, fits_in_memory, require_positive, try_with_capacity};

/// Evaluates a polynomial of degree `n - 1` at `x = 5` with Horner's method.
///
/// Coefficient `i` is `1.1 * i`, negated when `i` is a multiple of 3. The coefficients are
/// computed during preparation, so only the evaluation is measured.
#[derive(Debug)]
pub struct PolynomialEvaluation {
    n: usize,
}

impl PolynomialEvaluation {
    /// Name of the kernel.
    pub const NAME: &str = "polynomial-evaluation";

    /// Default number of coefficients.
    pub const DEFAULT_N: usize = 1000;

    /// Creates the kernel for a polynomial with `n` coefficients.
    ///
    /// # Errors
    ///
    /// Fails if `n` is zero or the coefficients could not be addressed.
    pub fn new(n: usize) -> Result<Self> {
        let n = require_positive(Self::NAME, "n", n)?;

        if !fits_in_memory::<f64>(Some(n)) {
            return Err(Error::invalid_size(
                Self::NAME,
                "n",
                format!("{n} coefficients do not fit in memory"),
            ));
        }

        Ok(Self { n })
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "coefficient indexes are far below 2^52"
)]
fn coefficients(n: usize) -> std::result::Result<Vec<f64>, PrepareError> {
    let mut coefficients = try_with_capacity(PolynomialEvaluation::NAME, n)?;

    coefficients.extend((0..n).map(|i| {
        let c = 1.1 * i as f64;
        if i % 3 == 0 { -c } else { c }
    }));

    Ok(coefficients)
}

impl Payload for PolynomialEvaluation {
    type State = Vec<f64>;
    type Output = f64;

    fn prepare(&mut self) -> std::result::Result<Vec<f64>, PrepareError> {
        coefficients(self.n)
    }

    fn execute(&mut self, coefficients: &mut Vec<f64>) -> std::result::Result<f64, ExecuteError> {
        Ok(coefficients.iter().fold(0.0, |acc, &c| c + 5.0 * acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_small_polynomial() {
        let mut kernel = PolynomialEvaluation::new(3).unwrap();
        let mut state = kernel.prepare().unwrap();

        // Coefficients -0.0, 1.1, 2.2: ((0 * 5) + 1.1) * 5 + 2.2
        let result = kernel.execute(&mut state).unwrap();

        assert!((result - 7.7).abs() < 1e-12);
    }

    #[test]
    fn every_third_coefficient_is_negative() {
        let cs = coefficients(7).unwrap();

        assert!(cs[3] < 0.0 && cs[6] < 0.0);
        assert!(cs[1] > 0.0 && cs[2] > 0.0 && cs[4] > 0.0);
    }

    #[test]
    fn repeated_execution_is_stable() {
        let mut kernel = PolynomialEvaluation::new(PolynomialEvaluation::DEFAULT_N).unwrap();
        let mut state = kernel.prepare().unwrap();

        let first = kernel.execute(&mut state).unwrap();
        let second = kernel.execute(&mut state).unwrap();

        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn zero_is_rejected() {
        assert!(PolynomialEvaluation::new(0).is_err());
    }

    #[test]
    fn unaddressable_size_is_rejected() {
        assert!(PolynomialEvaluation::new(usize::MAX).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn too_many_coefficients_fail_to_prepare() {
        let mut kernel = PolynomialEvaluation::new(1 << 59).unwrap();

        let error = kernel.prepare().unwrap_err();

        assert_eq!(error.payload(), PolynomialEvaluation::NAME);
    }
}
