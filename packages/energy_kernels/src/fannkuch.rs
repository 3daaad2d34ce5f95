#![allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "permutation indexes are bounded by n, which is bounded at construction"
)]

use derive_more::Display;
use energy_harness::{ExecuteError, Payload, PrepareError};

use crate::{Error, Result};

/// Largest accepted permutation length. 12! permutations already take minutes.
const MAX_N: usize = 12;

/// The outcome of a [`FannkuchRedux`] execution.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display("{checksum} (max flips {max_flips})")]
pub struct FannkuchResult {
    /// Alternating sum of flip counts over all permutations in generation order.
    pub checksum: i64,

    /// The largest number of flips needed by any permutation.
    pub max_flips: u32,
}

/// Counts pancake flips over every permutation of `0..n`.
///
/// For each permutation, the prefix up to the value of the first element is reversed until
/// the first element is 0.
#[derive(Debug)]
pub struct FannkuchRedux {
    n: usize,
}

impl FannkuchRedux {
    /// Name of the kernel.
    pub const NAME: &str = "fannkuch-redux";

    /// Default permutation length.
    pub const DEFAULT_N: usize = 7;

    /// Creates the kernel for permutations of length `n`.
    ///
    /// # Errors
    ///
    /// Fails if `n` is zero or above 12.
    pub fn new(n: usize) -> Result<Self> {
        if !(1..=MAX_N).contains(&n) {
            return Err(Error::invalid_size(
                Self::NAME,
                "n",
                format!("must be between 1 and {MAX_N}, was {n}"),
            ));
        }

        Ok(Self { n })
    }
}

fn count_flips(permutation: &[usize], scratch: &mut [usize]) -> u32 {
    scratch.copy_from_slice(permutation);

    let mut flips = 0;
    let mut first = scratch[0];

    while first != 0 {
        scratch[..=first].reverse();
        flips += 1;
        first = scratch[0];
    }

    flips
}

fn fannkuch(n: usize) -> FannkuchResult {
    let mut permutation: Vec<usize> = (0..n).collect();
    let mut scratch = vec![0; n];
    let mut count = vec![0; n];

    let mut checksum = 0_i64;
    let mut max_flips = 0_u32;
    let mut permutation_index = 0_u64;
    let mut r = n;

    loop {
        while r > 1 {
            count[r - 1] = r;
            r -= 1;
        }

        let flips = count_flips(&permutation, &mut scratch);
        max_flips = max_flips.max(flips);
        if permutation_index % 2 == 0 {
            checksum += i64::from(flips);
        } else {
            checksum -= i64::from(flips);
        }

        // Advance to the next permutation by rotating ever longer prefixes.
        loop {
            if r == n {
                return FannkuchResult {
                    checksum,
                    max_flips,
                };
            }

            permutation[..=r].rotate_left(1);

            count[r] -= 1;
            if count[r] > 0 {
                break;
            }
            r += 1;
        }

        permutation_index += 1;
    }
}

impl Payload for FannkuchRedux {
    type State = ();
    type Output = FannkuchResult;

    fn prepare(&mut self) -> std::result::Result<(), PrepareError> {
        Ok(())
    }

    fn execute(&mut self, _: &mut ()) -> std::result::Result<FannkuchResult, ExecuteError> {
        Ok(fannkuch(self.n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_results() {
        assert_eq!(
            fannkuch(7),
            FannkuchResult {
                checksum: 228,
                max_flips: 16
            }
        );
        assert_eq!(
            fannkuch(3),
            FannkuchResult {
                checksum: 2,
                max_flips: 2
            }
        );
    }

    #[test]
    fn trivial_permutation() {
        assert_eq!(
            fannkuch(1),
            FannkuchResult {
                checksum: 0,
                max_flips: 0
            }
        );
    }

    #[test]
    fn display() {
        let result = FannkuchResult {
            checksum: 228,
            max_flips: 16,
        };

        assert_eq!(result.to_string(), "228 (max flips 16)");
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(FannkuchRedux::new(0).is_err());
        assert!(FannkuchRedux::new(13).is_err());
    }
}
