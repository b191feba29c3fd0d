//! Dimension validator.
//!
//! Checks the shape of every configured buffer against the shapes implied by the number of states L,
//! measurements M and sigma points S = 2L+1. Runs once, before the filter is constructed.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, RealField, VectorN};

use crate::config::FilterConfig;
use crate::error::{Field, ShapeMismatch};

struct Checker {
    failures: Vec<ShapeMismatch>,
}

impl Checker {
    fn expect(&mut self, field: Field, expected: (usize, usize), found: Option<(usize, usize)>) {
        if found != Some(expected) {
            self.failures.push(ShapeMismatch { field, expected, found });
        }
    }
}

/// The shape of a sigma point set, `None` if it is empty.
///
/// Reports the row count of the first column differing from `rows`, so a single short column is found.
fn sigma_shape<N: RealField, D: Dim>(points: &[VectorN<N, D>], rows: usize) -> Option<(usize, usize)>
    where
        DefaultAllocator: Allocator<N, D>,
{
    if points.is_empty() {
        return None;
    }
    let found = points.iter().map(|p| p.nrows()).find(|&r| r != rows).unwrap_or(rows);
    Some((found, points.len()))
}

/// Validate a configuration for `x_len` states and `y_len` measurements.
///
/// Returns every failed check. The system input vectors are optional: they are only checked,
/// against each other, when both are present.
pub(super) fn check<N: RealField, D: Dim, ZD: Dim, UD: Dim>(
    config: &FilterConfig<N, D, ZD, UD>,
    x_len: usize,
    y_len: usize,
) -> Result<(), Vec<ShapeMismatch>>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>
            + Allocator<N, UD>,
{
    let s_len = 2 * x_len + 1;
    let ws = &config.workspace;
    let mut c = Checker { failures: Vec::new() };

    if x_len == 0 {
        c.expect(Field::State, (1, 1), Some(ws.x.shape()));
    }
    if y_len == 0 {
        c.expect(Field::PredictedMeasurement, (1, 1), Some(ws.y_m.shape()));
    }

    if let (Some(u), Some(u_prev)) = (&config.u, &config.u_prev) {
        c.expect(Field::PreviousSystemInput, u.shape(), Some(u_prev.shape()));
    }
    c.expect(Field::Measurement, (y_len, 1), Some(config.y.shape()));

    c.expect(Field::MeanWeights, (1, s_len), Some(ws.Wm.shape()));
    c.expect(Field::CovarianceWeights, (1, s_len), Some(ws.Wc.shape()));

    c.expect(Field::InitialState, (x_len, 1), Some(config.x0.shape()));
    c.expect(Field::InitialCovariance, (x_len, x_len), Some(config.Pxx0.shape()));
    c.expect(Field::ProcessNoise, (x_len, x_len), Some(config.Qxx.Q.shape()));
    c.expect(Field::MeasurementNoise, (y_len, y_len), Some(config.Ryy0.Q.shape()));

    c.expect(Field::Covariance, (x_len, x_len), Some(ws.Pxx.shape()));
    c.expect(Field::PreviousSigmaPoints, (x_len, s_len), sigma_shape(&ws.X_p, x_len));
    c.expect(Field::PredictedSigmaPoints, (x_len, s_len), sigma_shape(&ws.X_m, x_len));
    c.expect(Field::MeasurementSigmaPoints, (y_len, s_len), sigma_shape(&ws.Y_m, y_len));

    c.expect(Field::MeasurementCovariance, (y_len, y_len), Some(ws.Pyy.shape()));
    c.expect(Field::MeasurementCovarianceCopy, (y_len, y_len), Some(ws.Pyy_cpy.shape()));
    c.expect(Field::IdentityScratch, (y_len, y_len), Some(ws.Iyy.shape()));
    c.expect(Field::CrossCovariance, (x_len, y_len), Some(ws.Pxy.shape()));
    c.expect(Field::KalmanGain, (x_len, y_len), Some(ws.K.shape()));
    c.expect(Field::StateCorrection, (x_len, 1), Some(ws.x_corr.shape()));
    c.expect(Field::CovarianceCorrection, (x_len, x_len), Some(ws.Pxx_corr.shape()));

    if let Some(limits) = &config.limits {
        c.expect(Field::StateLimits, (x_len, 1), Some((limits.len(), 1)));
    }
    c.expect(Field::PredictionModels, (x_len, 1), Some((config.predict.len(), 1)));
    c.expect(Field::ObservationModels, (y_len, 1), Some((config.observe.len(), 1)));

    if c.failures.is_empty() {
        Ok(())
    } else {
        Err(c.failures)
    }
}
