//! Benchmark kernels for energy measurement runs.
//!
//! Every kernel implements [`Payload`][energy_harness::Payload] and is sized when it is
//! constructed. Invalid sizes are rejected (or normalized, where the kernel documents it) by
//! the constructor, before any energy probe is opened.
//!
//! | Kernel | Size | Result |
//! |---|---|---|
//! | [`PolynomialEvaluation`] | coefficients | value at `x = 5` |
//! | [`MatrixMultiplication`] | rows, columns | last dot product |
//! | [`DivisionLoop`] | harmonic target | smallest `n` reaching it |
//! | [`BinaryTrees`] | maximum depth | nodes checked |
//! | [`NBody`] | time steps | system energy |
//! | [`SpectralNorm`] | vector length | spectral norm |
//! | [`Mandelbrot`] | image size | pixels in the set |
//! | [`FannkuchRedux`] | permutation length | [`FannkuchResult`] |
//! | [`ShellCommand`] | command line | exit code |
//!
//! Preparation allocates whatever the kernel works on, so that with per-iteration
//! reinitialization the allocation stays outside the measurement window.

mod binary_trees;
mod buffers;
mod catalog;
mod command;
mod division_loop;
mod error;
mod fannkuch;
mod mandelbrot;
mod matrix;
mod n_body;
mod polynomial;
mod spectral_norm;

pub use binary_trees::*;
pub(crate) use buffers::{fits_in_memory, try_filled, try_with_capacity};
pub use catalog::*;
pub use command::*;
pub use division_loop::*;
pub(crate) use error::require_positive;
pub use error::{Error, Result};
pub use fannkuch::*;
pub use mandelbrot::*;
pub use matrix::*;
pub use n_body::*;
pub use polynomial::*;
pub use spectral_norm::*;
