//! Dense matrix operations used by the estimators.
//!
//! Every operation works in place on caller owned nalgebra storage and never allocates.
//! Operations that can fail report a [`MatrixError`] status instead of panicking.

use thiserror::Error;

pub mod cholesky;
pub mod ops;

pub use cholesky::cholesky_lower;
pub use ops::{add, copy, identity, invert, mul, mul_tr, scale, sub, zero};

/// Failure status of a matrix operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    #[error("{op}: operand is {}x{}, expected {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("matrix not positive definite, factorisation failed at column {column}")]
    NotPositiveDefinite { column: usize },

    #[error("matrix singular, inversion failed at pivot {pivot}")]
    Singular { pivot: usize },
}

pub type MatrixResult<T = ()> = Result<T, MatrixError>;

pub(crate) fn check_shape(op: &'static str, expected: (usize, usize), found: (usize, usize)) -> MatrixResult {
    if expected == found {
        Ok(())
    } else {
        Err(MatrixError::ShapeMismatch { op, expected, found })
    }
}
