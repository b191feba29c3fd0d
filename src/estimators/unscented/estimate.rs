#![allow(non_snake_case)]

//! The state and covariance buffers shared by the stages of a step.
//!
//! One state vector holds x(k-1), then x(k|k-1), then x(k). One covariance matrix holds P(k-1),
//! then its scaled Cholesky factor, then P(k|k-1), then P(k). The [`Phase`] tag records which role
//! the buffers currently play. Each stage is the single writer of the buffers during its phase.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField, VectorN};

/// The role of the shared estimate buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// x and Pxx hold the posterior estimate.
    Posterior,
    /// x holds the previous posterior, Pxx its scaled lower Cholesky factor (or a partial factor if factorisation failed).
    SigmaPoints,
    /// x holds the predicted mean, Pxx still the factor.
    PredictedMean,
    /// x and Pxx hold the predicted mean and covariance.
    Predicted,
}

pub(super) struct Estimate<N: RealField, D: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    pub x: VectorN<N, D>,
    pub Pxx: MatrixN<N, D>,
    pub phase: Phase,
}

impl<N: RealField, D: Dim> Estimate<N, D>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Move from phase `from` to `to`.
    pub fn advance(&mut self, from: Phase, to: Phase) {
        debug_assert_eq!(self.phase, from, "stage entered out of order");
        self.phase = to;
    }

    pub fn posterior(&self) -> Option<(&VectorN<N, D>, &MatrixN<N, D>)> {
        match self.phase {
            Phase::Posterior => Some((&self.x, &self.Pxx)),
            _ => None,
        }
    }
}
