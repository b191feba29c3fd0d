#![allow(non_snake_case)]

//! Derived filter constants, computed once at initialisation.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField, RowDVector, VectorN};

use crate::config::{ScalingParameters, StateLimit};

/// The parameter block of the filter.
pub struct Parameters<N: RealField, D: Dim, ZD: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD>,
{
    /// Number of states L
    pub x_len: usize,
    /// Number of measurements
    pub y_len: usize,
    /// Number of sigma points, 2L+1
    pub s_len: usize,
    pub scaling: ScalingParameters<N>,
    /// lambda = alpha^2 (L + kappa) - L
    pub lambda: N,
    /// Sigma point spread, sqrt(L + lambda)
    pub gamma: N,
    pub dt: N,
    /// Mean weights
    pub Wm: RowDVector<N>,
    /// Covariance weights
    pub Wc: RowDVector<N>,
    /// Process noise covariance
    pub Qxx: MatrixN<N, D>,
    /// Measurement noise covariance
    pub Ryy0: MatrixN<N, ZD>,
    /// Initial state covariance
    pub Pxx0: MatrixN<N, D>,
    /// Initial state
    pub x0: VectorN<N, D>,
    pub limits: Option<Vec<StateLimit<N>>>,
}

/// The scaling parameter lambda for `x_len` states.
pub fn lambda<N: RealField>(scaling: &ScalingParameters<N>, x_len: usize) -> N {
    let l: N = na::convert(x_len as f64);
    scaling.alpha * scaling.alpha * (l + scaling.kappa) - l
}

/// Fill the mean and covariance weights.
///
/// Wm(0) = lambda/(L+lambda), Wc(0) = Wm(0) + (1 - alpha^2 + beta), Wm(i) = Wc(i) = 1/(2(L+lambda)).
/// Weights are only computed when both vectors have 2L+1 elements, returns false otherwise.
pub fn weights<N: RealField>(scaling: &ScalingParameters<N>, x_len: usize, Wm: &mut RowDVector<N>, Wc: &mut RowDVector<N>) -> bool {
    let s_len = 2 * x_len + 1;
    if Wm.ncols() != s_len || Wc.ncols() != s_len {
        return false;
    }

    let l: N = na::convert(x_len as f64);
    let two: N = na::convert(2.0);
    let lambda = lambda(scaling, x_len);
    let alpha2 = scaling.alpha * scaling.alpha;

    let Wm0 = lambda / (l + lambda);
    Wm[0] = Wm0;
    Wc[0] = Wm0 + (N::one() - alpha2 + scaling.beta);

    let Wi = N::one() / (two * (l + lambda));
    for c in 1..s_len {
        Wm[c] = Wi;
        Wc[c] = Wi;
    }
    true
}

impl<N: RealField, D: Dim, ZD: Dim> Parameters<N, D, ZD>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD>,
{
    /// Clamp a value of state `i` by its limiter, if it has an enabled one.
    pub fn clamp(&self, i: usize, value: N) -> N {
        match &self.limits {
            Some(limits) => limits[i].clamp(value),
            None => value,
        }
    }

    /// Disable every enabled limiter whose range is too narrow to be meaningful.
    pub(super) fn sanitise_limits(&mut self) {
        if let Some(limits) = &mut self.limits {
            for (i, limit) in limits.iter_mut().enumerate() {
                if limit.enabled && limit.too_narrow() {
                    log::warn!("state {} limiter range {:?}..{:?} narrower than {:?}, limiter disabled", i, limit.min, limit.max, limit.epsilon);
                    limit.enabled = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sum(w: &RowDVector<f64>) -> f64 {
        w.iter().sum()
    }

    #[test]
    fn mean_weights_sum_to_one() {
        for &x_len in &[1usize, 2, 3, 7] {
            for &alpha in &[1e-3, 0.1, 0.5, 1.0] {
                for &kappa in &[0.0, 1.0, 3.0 - x_len as f64] {
                    let scaling = ScalingParameters { alpha, beta: 2.0, kappa };
                    if x_len as f64 + lambda(&scaling, x_len) <= 0.0 {
                        continue;
                    }
                    let mut Wm = RowDVector::zeros(2 * x_len + 1);
                    let mut Wc = RowDVector::zeros(2 * x_len + 1);
                    assert!(weights(&scaling, x_len, &mut Wm, &mut Wc));
                    assert_relative_eq!(sum(&Wm), 1.0, epsilon = 1e-6);
                    assert_relative_eq!(Wc[0], Wm[0] + 1.0 - alpha * alpha + 2.0, max_relative = 1e-12);
                    for c in 1..Wm.ncols() {
                        assert_eq!(Wm[c], Wc[c]);
                    }
                }
            }
        }
    }

    #[test]
    fn known_lambda() {
        let scaling = ScalingParameters { alpha: 0.5, beta: 2.0, kappa: 1.0 };
        // 0.25 * (2 + 1) - 2
        assert_relative_eq!(lambda(&scaling, 2), -1.25);

        let mut Wm = RowDVector::zeros(5);
        let mut Wc = RowDVector::zeros(5);
        weights(&scaling, 2, &mut Wm, &mut Wc);
        assert_relative_eq!(Wm[0], -1.25 / 0.75);
        assert_relative_eq!(Wm[1], 1.0 / 1.5);
    }

    #[test]
    fn weights_need_sigma_length() {
        let scaling = ScalingParameters { alpha: 1.0, beta: 2.0, kappa: 0.0 };
        let mut Wm = RowDVector::zeros(4);
        let mut Wc = RowDVector::zeros(5);
        assert!(!weights(&scaling, 2, &mut Wm, &mut Wc));
        assert_eq!(Wm[0], 0.0);
    }
}
