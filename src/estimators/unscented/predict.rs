//! Step 2: Prediction transformation.
//!
//! X_m = f(X_p, u_p), x_m = sum(Wm(c) * X_m(c)) for c = 0..2L

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};

use super::estimate::{Estimate, Phase};
use super::parameters::Parameters;
use super::{Prediction, Previous};

/// Propagate every previous sigma point through the state models, accumulating the predicted mean
/// into the state buffer.
///
/// A state without a model keeps its sigma point coordinate.
pub(super) fn propagate<N: RealField, D: Dim, ZD: Dim, UD: Dim>(
    par: &Parameters<N, D, ZD>,
    prev: &Previous<N, D, UD>,
    predict: &mut Prediction<N, D, ZD, UD>,
    est: &mut Estimate<N, D>,
)
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, UD>,
{
    let u_p = prev.u_p.as_ref();

    for i in 0..par.x_len {
        let mut mean = N::zero();
        for c in 0..par.s_len {
            let value = match &predict.f[i] {
                Some(model) => model.predict(u_p, &prev.X_p[c], par.dt),
                None => prev.X_p[c][i],
            };
            predict.X_m[c][i] = value;
            mean += par.Wm[c] * value;
        }
        est.x[i] = mean;
    }

    est.advance(Phase::SigmaPoints, Phase::PredictedMean);
}
