use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// The kernels this package provides, by command-line name.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum KernelKind {
    /// [`PolynomialEvaluation`][crate::PolynomialEvaluation]
    #[display("polynomial-evaluation")]
    PolynomialEvaluation,

    /// [`MatrixMultiplication`][crate::MatrixMultiplication]
    #[display("matrix-multiplication")]
    MatrixMultiplication,

    /// [`DivisionLoop`][crate::DivisionLoop]
    #[display("division-loop")]
    DivisionLoop,

    /// [`BinaryTrees`][crate::BinaryTrees]
    #[display("binary-trees")]
    BinaryTrees,

    /// [`NBody`][crate::NBody]
    #[display("n-body")]
    NBody,

    /// [`SpectralNorm`][crate::SpectralNorm]
    #[display("spectral-norm")]
    SpectralNorm,

    /// [`Mandelbrot`][crate::Mandelbrot]
    #[display("mandelbrot")]
    Mandelbrot,

    /// [`FannkuchRedux`][crate::FannkuchRedux]
    #[display("fannkuch-redux")]
    FannkuchRedux,

    /// [`ShellCommand`][crate::ShellCommand]
    #[display("command")]
    Command,
}

impl KernelKind {
    /// Every kernel, in the order they are listed in help text.
    pub const ALL: &[Self] = &[
        Self::PolynomialEvaluation,
        Self::MatrixMultiplication,
        Self::DivisionLoop,
        Self::BinaryTrees,
        Self::NBody,
        Self::SpectralNorm,
        Self::Mandelbrot,
        Self::FannkuchRedux,
        Self::Command,
    ];
}

impl FromStr for KernelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| Error::UnknownKernel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in KernelKind::ALL {
            assert_eq!(kind.to_string().parse::<KernelKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let error = "bubble-sort".parse::<KernelKind>().unwrap_err();

        assert!(matches!(error, Error::UnknownKernel(ref name) if name == "bubble-sort"));
    }
}
