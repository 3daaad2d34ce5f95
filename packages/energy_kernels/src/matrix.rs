#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "dense matrix kernel, indexes are bounded by the matrix dimensions"
)]

use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Error, Result, fits_in_memory, require_positive, try_filled};

/// A dense row-major matrix.
#[derive(Debug)]
struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    fn zeroed(rows: usize, cols: usize) -> std::result::Result<Self, PrepareError> {
        Ok(Self {
            rows,
            cols,
            data: try_filled(MatrixMultiplication::NAME, rows * cols, 0.0)?,
        })
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "matrix dimensions are far below 2^52"
    )]
    fn index_sum(rows: usize, cols: usize) -> std::result::Result<Self, PrepareError> {
        let mut matrix = Self::zeroed(rows, cols)?;

        for i in 0..rows {
            for j in 0..cols {
                matrix.data[i * cols + j] = (i + j) as f64;
            }
        }

        Ok(matrix)
    }
}

/// Operands and result buffer of a [`MatrixMultiplication`].
#[derive(Debug)]
pub struct Operands {
    a: Matrix,
    b: Matrix,
    product: Matrix,
}

/// Multiplies a `rows x cols` matrix by a `cols x rows` matrix with the naive triple loop.
///
/// Element `(i, j)` of both operands is `i + j`. The result of one execution is the last dot
/// product computed, which is the bottom-right element of the product.
#[derive(Debug)]
pub struct MatrixMultiplication {
    rows: usize,
    cols: usize,
}

impl MatrixMultiplication {
    /// Name of the kernel.
    pub const NAME: &str = "matrix-multiplication";

    /// Default number of rows of the left operand.
    pub const DEFAULT_ROWS: usize = 80;

    /// Default number of columns of the left operand.
    pub const DEFAULT_COLS: usize = 80;

    /// Creates the kernel for a `rows x cols` left operand.
    ///
    /// # Errors
    ///
    /// Fails if either dimension is zero or the operands would not fit in memory.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let rows = require_positive(Self::NAME, "rows", rows)?;
        let cols = require_positive(Self::NAME, "cols", cols)?;

        if !fits_in_memory::<f64>(rows.checked_mul(cols))
            || !fits_in_memory::<f64>(rows.checked_mul(rows))
        {
            return Err(Error::invalid_size(
                Self::NAME,
                "rows",
                format!("{rows}x{cols} matrices do not fit in memory"),
            ));
        }

        Ok(Self { rows, cols })
    }
}

impl Payload for MatrixMultiplication {
    type State = Operands;
    type Output = f64;

    fn prepare(&mut self) -> std::result::Result<Operands, PrepareError> {
        Ok(Operands {
            a: Matrix::index_sum(self.rows, self.cols)?,
            b: Matrix::index_sum(self.cols, self.rows)?,
            product: Matrix::zeroed(self.rows, self.rows)?,
        })
    }

    fn execute(&mut self, operands: &mut Operands) -> std::result::Result<f64, ExecuteError> {
        let Operands { a, b, product } = operands;
        let mut sum = 0.0;

        for i in 0..product.rows {
            for j in 0..product.cols {
                sum = 0.0;
                for k in 0..a.cols {
                    sum += a.data[i * a.cols + k] * b.data[k * b.cols + j];
                }
                product.data[i * product.cols + j] = sum;
            }
        }

        Ok(sum)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, reason = "exact small integers")]
mod tests {
    use super::*;

    #[test]
    fn two_by_two() {
        let mut kernel = MatrixMultiplication::new(2, 2).unwrap();
        let mut operands = kernel.prepare().unwrap();

        // Bottom-right: 1*1 + 2*2
        assert_eq!(kernel.execute(&mut operands).unwrap(), 5.0);

        // [[0,1],[1,2]] squared
        assert_eq!(operands.product.data, [1.0, 2.0, 2.0, 5.0]);
    }

    #[test]
    fn rectangular_operands() {
        let mut kernel = MatrixMultiplication::new(2, 3).unwrap();
        let mut operands = kernel.prepare().unwrap();

        // Row 1 of A is [1,2,3], column 1 of B is [1,2,3].
        assert_eq!(kernel.execute(&mut operands).unwrap(), 14.0);
        assert_eq!(operands.product.data.len(), 4);
    }

    #[test]
    fn default_size_result() {
        let mut kernel = MatrixMultiplication::new(
            MatrixMultiplication::DEFAULT_ROWS,
            MatrixMultiplication::DEFAULT_COLS,
        )
        .unwrap();
        let mut operands = kernel.prepare().unwrap();

        // Sum of (79 + k)^2 for k in 0..80.
        let expected: f64 = (0..80_u32).map(|k| f64::from((79 + k) * (79 + k))).sum();

        assert_eq!(kernel.execute(&mut operands).unwrap(), expected);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(MatrixMultiplication::new(0, 4).is_err());
        assert!(MatrixMultiplication::new(4, 0).is_err());
    }

    #[test]
    fn unaddressable_operands_are_rejected() {
        assert!(MatrixMultiplication::new(1 << 31, 1 << 31).is_err());
        assert!(MatrixMultiplication::new(usize::MAX, 2).is_err());
        assert!(MatrixMultiplication::new(2, usize::MAX).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn operands_beyond_available_memory_fail_to_prepare() {
        // 2^56 elements of 8 bytes are addressable but can never be allocated.
        let mut kernel = MatrixMultiplication::new(1 << 28, 1 << 28).unwrap();

        let error = kernel.prepare().unwrap_err();

        assert_eq!(error.payload(), MatrixMultiplication::NAME);
    }
}
