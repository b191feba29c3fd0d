#![allow(non_snake_case)]

//! Step 4: Measurement update.
//!
//! K = Pxy.inv(Pyy), x = x_m + K(y - y_m), Pxx = P_m - K.Pyy.K'

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};

use super::estimate::{Estimate, Phase};
use super::{Input, Prediction, Update};
use crate::error::{Stage, StepError};
use crate::linalg;

/// Correct the predicted estimate with the measurement.
///
/// The measurement vector is replaced by the innovation y - y_m, Pxy is replaced by K.Pyy.
/// If Pyy cannot be inverted nothing is modified and the buffers stay in the predicted phase.
pub(super) fn correct<N: RealField, D: Dim, ZD: Dim, UD: Dim>(
    input: &mut Input<N, ZD, UD>,
    predict: &Prediction<N, D, ZD, UD>,
    update: &mut Update<N, D, ZD>,
    est: &mut Estimate<N, D>,
) -> Result<(), StepError>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>
            + Allocator<N, UD>,
{
    let at = StepError::at(Stage::Correction);

    // Kalman gain
    linalg::identity(&mut update.Iyy).map_err(&at)?;
    linalg::copy(&mut update.Pyy_cpy, &update.Pyy).map_err(&at)?;
    linalg::invert(&mut update.Pyy_cpy, &mut update.Iyy).map_err(StepError::InnovationCovariance)?;
    linalg::mul(&update.Pxy, &update.Iyy, &mut update.K).map_err(&at)?;

    // State estimate
    linalg::sub(&mut input.y, &predict.y_m).map_err(&at)?;
    linalg::mul(&update.K, &input.y, &mut update.x_corr).map_err(&at)?;
    linalg::add(&mut est.x, &update.x_corr).map_err(&at)?;

    // Error covariance, Pxy holds K.Pyy
    linalg::mul(&update.K, &update.Pyy, &mut update.Pxy).map_err(&at)?;
    linalg::mul_tr(&update.Pxy, &update.K, &mut update.Pxx_corr).map_err(&at)?;
    linalg::sub(&mut est.Pxx, &update.Pxx_corr).map_err(&at)?;

    est.advance(Phase::Predicted, Phase::Posterior);
    Ok(())
}
