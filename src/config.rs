#![allow(non_snake_case)]

//! Filter configuration.
//!
//! The model building side of an application supplies a [`FilterConfig`] once, when the filter is
//! constructed. It holds the tuning constants, the initial estimate, the noise covariances, the models
//! and a [`Workspace`] of every buffer the filter works in. The filter takes ownership of all of it and
//! never allocates again.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, Dynamic, MatrixMN, MatrixN, RealField, RowDVector, U1, VectorN};
#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::models::{ObservationModels, PredictionModels};
use crate::noise::CorrelatedNoise;

/// A sigma point set of `2L+1` points, element c being column c of the
/// `L x (2L+1)` sigma point matrix.
pub type SigmaPoints<N, D> = Vec<VectorN<N, D>>;

/// Unscented transform scaling constants.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ScalingParameters<N> {
    /// Spread of the sigma points about the mean, in (0,1]. Smaller alpha gives tighter sigma points.
    pub alpha: N,
    /// Prior knowledge of the distribution, 2 is optimal for a Gaussian.
    pub beta: N,
    /// Secondary scaling, usually 0.
    pub kappa: N,
}

/// Clamp range of one state, applied to the generated sigma points.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct StateLimit<N> {
    pub min: N,
    pub max: N,
    /// Smallest meaningful range, a limiter with `min + epsilon > max` is disabled.
    pub epsilon: N,
    pub enabled: bool,
}

impl<N: RealField> StateLimit<N> {
    pub fn new(min: N, max: N, epsilon: N) -> Self {
        StateLimit { min, max, epsilon, enabled: true }
    }

    /// The range is too narrow to be meaningful.
    pub fn too_narrow(&self) -> bool {
        self.min + self.epsilon > self.max
    }

    pub fn clamp(&self, value: N) -> N {
        if !self.enabled {
            value
        } else if self.min > value {
            self.min
        } else if self.max < value {
            self.max
        } else {
            value
        }
    }
}

/// Every working buffer of the filter.
///
/// Shapes, with L states, M measurements and S = 2L+1 sigma points:
/// `x` L, `Pxx` LxL, `Wm` `Wc` 1xS, sigma points LxS (`X_p`, `X_m`) and MxS (`Y_m`), `y_m` M,
/// `Pyy` `Pyy_cpy` `Iyy` MxM, `Pxy` `K` LxM, `x_corr` L, `Pxx_corr` LxL.
pub struct Workspace<N: RealField, D: Dim, ZD: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>,
{
    /// State vector, holds the previous, predicted and corrected state in turn. Its length is L.
    pub x: VectorN<N, D>,
    /// State covariance, holds the previous, predicted and corrected covariance in turn.
    pub Pxx: MatrixN<N, D>,
    pub Wm: RowDVector<N>,
    pub Wc: RowDVector<N>,
    pub X_p: SigmaPoints<N, D>,
    pub X_m: SigmaPoints<N, D>,
    pub Y_m: SigmaPoints<N, ZD>,
    /// Predicted measurement mean. Its length is M.
    pub y_m: VectorN<N, ZD>,
    pub Pyy: MatrixN<N, ZD>,
    pub Pyy_cpy: MatrixN<N, ZD>,
    pub Iyy: MatrixN<N, ZD>,
    pub Pxy: MatrixMN<N, D, ZD>,
    pub K: MatrixMN<N, D, ZD>,
    pub x_corr: VectorN<N, D>,
    pub Pxx_corr: MatrixN<N, D>,
}

impl<N: RealField, D: Dim, ZD: Dim> Workspace<N, D, ZD>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>,
{
    /// Allocate a zeroed workspace for `d` states and `zd` measurements.
    pub fn new(d: D, zd: ZD) -> Self {
        let s_len = 2 * d.value() + 1;
        Workspace {
            x: VectorN::zeros_generic(d, U1),
            Pxx: MatrixN::zeros_generic(d, d),
            Wm: RowDVector::zeros_generic(U1, Dynamic::new(s_len)),
            Wc: RowDVector::zeros_generic(U1, Dynamic::new(s_len)),
            X_p: vec![VectorN::zeros_generic(d, U1); s_len],
            X_m: vec![VectorN::zeros_generic(d, U1); s_len],
            Y_m: vec![VectorN::zeros_generic(zd, U1); s_len],
            y_m: VectorN::zeros_generic(zd, U1),
            Pyy: MatrixN::zeros_generic(zd, zd),
            Pyy_cpy: MatrixN::zeros_generic(zd, zd),
            Iyy: MatrixN::zeros_generic(zd, zd),
            Pxy: MatrixMN::zeros_generic(d, zd),
            K: MatrixMN::zeros_generic(d, zd),
            x_corr: VectorN::zeros_generic(d, U1),
            Pxx_corr: MatrixN::zeros_generic(d, d),
        }
    }
}

/// Initialisation configuration of an [`UnscentedFilter`](crate::estimators::unscented::UnscentedFilter).
///
/// `u` and `u_prev` are optional, the previous input is only maintained when both are present.
pub struct FilterConfig<N: RealField, D: Dim, ZD: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>
            + Allocator<N, UD>,
{
    pub scaling: ScalingParameters<N>,
    /// Fixed time step between estimation cycles.
    pub dt: N,
    pub x0: VectorN<N, D>,
    pub Pxx0: MatrixN<N, D>,
    pub Qxx: CorrelatedNoise<N, D>,
    pub Ryy0: CorrelatedNoise<N, ZD>,
    /// Per state limiters, one per state when present.
    pub limits: Option<Vec<StateLimit<N>>>,
    pub u: Option<VectorN<N, UD>>,
    pub u_prev: Option<VectorN<N, UD>>,
    /// Measurement vector, written by the caller before each step.
    pub y: VectorN<N, ZD>,
    pub workspace: Workspace<N, D, ZD>,
    pub predict: PredictionModels<N, D, UD>,
    pub observe: ObservationModels<N, D, UD>,
}
