#![allow(non_snake_case)]

//! Step 3: Observation transformation and the covariances of the sigma point ensemble.
//!
//! P_m = Q + sum(Wc(c) * (X_m(c) - x_m)(X_m(c) - x_m)'), Y_m = h(X_m, u), y_m = sum(Wm(c) * Y_m(c))
//!
//! Pyy = R + sum(Wc(c) * (Y_m(c) - y_m)(Y_m(c) - y_m)'), Pxy = sum(Wc(c) * (X_m(c) - x_m)(Y_m(c) - y_m)')

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};

use super::estimate::{Estimate, Phase};
use super::parameters::Parameters;
use super::{Input, Prediction, Update};
use crate::error::{Stage, StepError};
use crate::linalg;

/// Accumulate the predicted state covariance and propagate the predicted sigma points through the
/// output models, accumulating the predicted measurement mean.
///
/// An output without a model observes zero.
pub(super) fn observe<N: RealField, D: Dim, ZD: Dim, UD: Dim>(
    par: &Parameters<N, D, ZD>,
    input: &Input<N, ZD, UD>,
    predict: &mut Prediction<N, D, ZD, UD>,
    est: &mut Estimate<N, D>,
) -> Result<(), StepError>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, UD>,
{
    let u = input.u.as_ref();

    linalg::zero(&mut predict.y_m);
    // P(k|k-1) = Q(k-1), replaces the factor
    linalg::copy(&mut est.Pxx, &par.Qxx).map_err(StepError::at(Stage::Observation))?;
    est.advance(Phase::PredictedMean, Phase::Predicted);

    let x_m = &est.x;
    let P_m = &mut est.Pxx;
    for c in 0..par.s_len {
        let Wc = par.Wc[c];
        let Wm = par.Wm[c];
        let X_c = &predict.X_m[c];

        for i in 0..par.x_len {
            let term1 = X_c[i] - x_m[i];
            for j in 0..par.x_len {
                let term2 = X_c[j] - x_m[j];
                P_m[(i, j)] += Wc * term1 * term2;
            }
        }

        for k in 0..par.y_len {
            let value = match &predict.h[k] {
                Some(model) => model.observe(u, X_c),
                None => N::zero(),
            };
            predict.Y_m[c][k] = value;
            predict.y_m[k] += Wm * value;
        }
    }
    Ok(())
}

/// Seed and accumulate the predicted measurement covariance Pyy and the cross covariance Pxy.
pub(super) fn covariances<N: RealField, D: Dim, ZD: Dim, UD: Dim>(
    par: &Parameters<N, D, ZD>,
    predict: &Prediction<N, D, ZD, UD>,
    est: &Estimate<N, D>,
    update: &mut Update<N, D, ZD>,
) -> Result<(), StepError>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>
            + Allocator<N, UD>,
{
    debug_assert_eq!(est.phase, Phase::Predicted);

    // Pyy(k|k-1) = R(k)
    linalg::copy(&mut update.Pyy, &par.Ryy0).map_err(StepError::at(Stage::Covariance))?;
    linalg::zero(&mut update.Pxy);

    let x_m = &est.x;
    let y_m = &predict.y_m;
    for c in 0..par.s_len {
        let Wc = par.Wc[c];
        let X_c = &predict.X_m[c];
        let Y_c = &predict.Y_m[c];

        for i in 0..par.y_len {
            let term1 = Y_c[i] - y_m[i];
            for j in 0..par.y_len {
                let term2 = Y_c[j] - y_m[j];
                update.Pyy[(i, j)] += Wc * term1 * term2;
            }
        }

        for i in 0..par.x_len {
            let term1 = X_c[i] - x_m[i];
            for j in 0..par.y_len {
                let term2 = Y_c[j] - y_m[j];
                update.Pxy[(i, j)] += Wc * term1 * term2;
            }
        }
    }
    Ok(())
}
