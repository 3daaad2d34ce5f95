#![allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "indexes are bounded by the vector length, which is bounded at construction"
)]

use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Error, Result, require_positive, try_filled};

/// Power iteration rounds per execution.
const ROUNDS: usize = 10;

/// Largest accepted vector length. The matrix entry formula must not overflow.
const MAX_N: usize = 1 << 24;

/// Entry `(i, j)` of the infinite matrix `A`: `1 / ((i + j)(i + j + 1) / 2 + i + 1)`.
#[expect(
    clippy::cast_precision_loss,
    clippy::integer_division,
    reason = "the triangular number is exact and far below 2^52"
)]
fn a(i: usize, j: usize) -> f64 {
    let sum = i + j;
    1.0 / ((sum * (sum + 1) / 2 + i + 1) as f64)
}

/// `out = A * v`
fn multiply_a(v: &[f64], out: &mut [f64]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = v.iter().enumerate().map(|(j, x)| a(i, j) * x).sum();
    }
}

/// `out = A^T * v`
fn multiply_a_transposed(v: &[f64], out: &mut [f64]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = v.iter().enumerate().map(|(j, x)| a(j, i) * x).sum();
    }
}

/// `out = A^T * A * v`, using `tmp` for the intermediate product.
fn multiply_ata(v: &[f64], out: &mut [f64], tmp: &mut [f64]) {
    multiply_a(v, tmp);
    multiply_a_transposed(tmp, out);
}

fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Work vectors of a [`SpectralNorm`] execution.
#[derive(Debug)]
pub struct Vectors {
    u: Vec<f64>,
    v: Vec<f64>,
    tmp: Vec<f64>,
}

/// Approximates the spectral norm of the `n x n` leading block of an infinite matrix with
/// power iteration.
///
/// The vectors are allocated during preparation and reset at the start of every execution,
/// so every execution computes the same value.
#[derive(Debug)]
pub struct SpectralNorm {
    n: usize,
}

impl SpectralNorm {
    /// Name of the kernel.
    pub const NAME: &str = "spectral-norm";

    /// Default vector length.
    pub const DEFAULT_N: usize = 100;

    /// Creates the kernel for vectors of length `n`.
    ///
    /// Odd lengths are rounded up to the next even length.
    ///
    /// # Errors
    ///
    /// Fails if `n` is zero or above 2^24.
    pub fn new(n: usize) -> Result<Self> {
        let n = require_positive(Self::NAME, "n", n)?;

        if n > MAX_N {
            return Err(Error::invalid_size(
                Self::NAME,
                "n",
                format!("must be at most {MAX_N}, was {n}"),
            ));
        }

        Ok(Self { n: n + n % 2 })
    }

    /// The vector length after normalization.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }
}

impl Payload for SpectralNorm {
    type State = Vectors;
    type Output = f64;

    fn prepare(&mut self) -> std::result::Result<Vectors, PrepareError> {
        Ok(Vectors {
            u: try_filled(Self::NAME, self.n, 0.0)?,
            v: try_filled(Self::NAME, self.n, 0.0)?,
            tmp: try_filled(Self::NAME, self.n, 0.0)?,
        })
    }

    fn execute(&mut self, vectors: &mut Vectors) -> std::result::Result<f64, ExecuteError> {
        let Vectors { u, v, tmp } = vectors;
        u.fill(1.0);

        for _ in 0..ROUNDS {
            multiply_ata(u, v, tmp);
            multiply_ata(v, u, tmp);
        }

        Ok((dot(u, v) / dot(v, v)).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(n: usize) -> f64 {
        let mut kernel = SpectralNorm::new(n).unwrap();
        let mut vectors = kernel.prepare().unwrap();
        kernel.execute(&mut vectors).unwrap()
    }

    #[test]
    fn matrix_entries() {
        assert!((a(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((a(0, 1) - 0.5).abs() < f64::EPSILON);
        assert!((a(1, 0) - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_size_result() {
        let norm = run(SpectralNorm::DEFAULT_N);

        assert!((norm - 1.274_219_991).abs() < 1e-9, "{norm}");
    }

    #[test]
    fn odd_size_is_rounded_up() {
        assert_eq!(SpectralNorm::new(99).unwrap().n(), 100);
        assert_eq!(SpectralNorm::new(100).unwrap().n(), 100);
    }

    #[test]
    fn repeated_execution_is_stable() {
        let mut kernel = SpectralNorm::new(10).unwrap();
        let mut vectors = kernel.prepare().unwrap();

        let first = kernel.execute(&mut vectors).unwrap();
        let second = kernel.execute(&mut vectors).unwrap();

        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(SpectralNorm::new(0).is_err());
        assert!(SpectralNorm::new(MAX_N + 1).is_err());
    }
}
