#![allow(non_snake_case)]

//! Step 1: Generate the sigma points.
//!
//! sqrt(Pxx_p) = chol(Pxx_p), X_p = [x_p, x_p + gamma.sqrt(Pxx_p), x_p - gamma.sqrt(Pxx_p)] with gamma = sqrt(L + lambda).

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};

use super::estimate::{Estimate, Phase};
use super::parameters::Parameters;
use crate::config::SigmaPoints;
use crate::error::StepError;
use crate::linalg;

/// Factorise the previous covariance in place and generate the previous sigma points.
///
/// `X_p` is only written if the factorisation succeeds. Each coordinate is clamped by its state limiter.
///
/// Return: reciprocal condition number estimate of the previous covariance
pub(super) fn generate<N: RealField, D: Dim, ZD: Dim>(
    par: &Parameters<N, D, ZD>,
    est: &mut Estimate<N, D>,
    X_p: &mut SigmaPoints<N, D>,
) -> Result<N, StepError>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD>,
{
    let x_len = par.x_len;
    est.advance(Phase::Posterior, Phase::SigmaPoints);

    let rcond = linalg::cholesky_lower(&mut est.Pxx).map_err(StepError::SigmaPoints)?;
    linalg::scale(&mut est.Pxx, par.gamma);

    let x = &est.x;
    let L = &est.Pxx;
    for i in 0..x_len {
        X_p[0][i] = par.clamp(i, x[i]);
    }
    for c in 1..par.s_len {
        let sigma = &mut X_p[c];
        for i in 0..x_len {
            let value = if c <= x_len {
                x[i] + L[(i, c - 1)]
            } else {
                x[i] - L[(i, c - x_len - 1)]
            };
            sigma[i] = par.clamp(i, value);
        }
    }

    Ok(rcond)
}
