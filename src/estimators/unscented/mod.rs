#![allow(non_snake_case)]

//! Additive noise Unscented Kalman Filter.
//!
//! A discrete time estimator for nonlinear systems where process and measurement noise enter additively.
//! Each state has its own scalar prediction model and each measurement its own scalar observation model.
//!
//! The filter owns a fixed set of buffers supplied at construction. One estimation step runs the stages
//! in order: sigma point generation, prediction transform, observation transform, covariances and the
//! measurement update. The state and covariance buffers are shared by every stage and move through the
//! phases of [`Phase`].
//!
//! References
//! [1] "The Unscented Kalman Filter for Nonlinear Estimation", E. A. Wan and R. van der Merwe

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN};

use crate::config::{FilterConfig, SigmaPoints, Workspace};
use crate::error::{Field, InitError, ShapeMismatch, Stage, StepError};
use crate::linalg;
use crate::models::{KalmanState, ObservationModels, PredictionModels};

mod estimate;
mod observe;
mod parameters;
mod predict;
mod sigma;
mod update;
mod validate;

pub use estimate::Phase;
pub use parameters::{lambda, weights, Parameters};

use estimate::Estimate;

/// The system input and measurement of the step about to be made.
///
/// Written by the caller before each [`UnscentedFilter::step`]. After a step the measurement
/// vector holds the innovation y - y_m.
pub struct Input<N: RealField, ZD: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, ZD> + Allocator<N, UD>,
{
    pub u: Option<VectorN<N, UD>>,
    pub y: VectorN<N, ZD>,
}

/// The previous system input and the sigma points of the previous estimate.
struct Previous<N: RealField, D: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    u_p: Option<VectorN<N, UD>>,
    X_p: SigmaPoints<N, D>,
}

/// The transformed sigma points and the models transforming them.
struct Prediction<N: RealField, D: Dim, ZD: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, UD>,
{
    X_m: SigmaPoints<N, D>,
    Y_m: SigmaPoints<N, ZD>,
    y_m: VectorN<N, ZD>,
    f: PredictionModels<N, D, UD>,
    h: ObservationModels<N, D, UD>,
}

/// Measurement update buffers.
struct Update<N: RealField, D: Dim, ZD: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, D, ZD>,
{
    Pyy: MatrixN<N, ZD>,
    Pyy_cpy: MatrixN<N, ZD>,
    Iyy: MatrixN<N, ZD>,
    Pxy: MatrixMN<N, D, ZD>,
    K: MatrixMN<N, D, ZD>,
    x_corr: VectorN<N, D>,
    Pxx_corr: MatrixN<N, D>,
}

/// Unscented Kalman Filter with additive process and measurement noise.
pub struct UnscentedFilter<N: RealField, D: Dim, ZD: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>
            + Allocator<N, UD>,
{
    par: Parameters<N, D, ZD>,
    prev: Previous<N, D, UD>,
    input: Input<N, ZD, UD>,
    predict: Prediction<N, D, ZD, UD>,
    update: Update<N, D, ZD>,
    estimate: Estimate<N, D>,
}

fn to_f64<N: RealField>(v: N) -> f64 {
    v.to_subset().unwrap_or(f64::NAN)
}

impl<N: RealField, D: Dim, ZD: Dim, UD: Dim> UnscentedFilter<N, D, ZD, UD>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, ZD, ZD> + Allocator<N, ZD> + Allocator<N, D, ZD>
            + Allocator<N, UD>,
{
    /// Construct the filter from its configuration.
    ///
    /// The number of states is the length of the workspace state vector and the number of measurements
    /// the length of the workspace predicted measurement. Every shape is checked against them, all
    /// failing checks are reported together. The estimate is seeded with the initial state and covariance.
    pub fn new(config: FilterConfig<N, D, ZD, UD>) -> Result<Self, InitError> {
        let x_len = config.workspace.x.nrows();
        let y_len = config.workspace.y_m.nrows();

        if let Err(failures) = validate::check(&config, x_len, y_len) {
            for failure in &failures {
                log::warn!("filter configuration: {}", failure);
            }
            return Err(InitError::Configuration(failures));
        }

        let lambda = parameters::lambda(&config.scaling, x_len);
        let l: N = na::convert(x_len as f64);
        let spread = l + lambda;
        if !(config.scaling.alpha > N::zero()) || !(spread > N::zero()) {
            let err = InitError::Scaling { alpha: to_f64(config.scaling.alpha), spread: to_f64(spread) };
            log::warn!("{}", err);
            return Err(err);
        }

        if config.u.is_some() && config.u_prev.is_none() {
            log::warn!("system input without a previous system input, prediction models never see an input");
        }

        let FilterConfig { scaling, dt, x0, Pxx0, Qxx, Ryy0, limits, u, u_prev, y, workspace, predict, observe } = config;
        let Workspace { x, Pxx, mut Wm, mut Wc, X_p, X_m, Y_m, y_m, Pyy, Pyy_cpy, Iyy, Pxy, K, x_corr, Pxx_corr } = workspace;

        let filled = parameters::weights(&scaling, x_len, &mut Wm, &mut Wc);
        debug_assert!(filled, "weight lengths validated");

        let mut par = Parameters {
            x_len,
            y_len,
            s_len: 2 * x_len + 1,
            scaling,
            lambda,
            gamma: spread.sqrt(),
            dt,
            Wm,
            Wc,
            Qxx: Qxx.Q,
            Ryy0: Ryy0.Q,
            Pxx0,
            x0,
            limits,
        };
        par.sanitise_limits();

        let mut estimate = Estimate { x, Pxx, phase: Phase::Posterior };
        estimate.x.copy_from(&par.x0);
        estimate.Pxx.copy_from(&par.Pxx0);

        log::debug!(
            "unscented filter with {} states, {} measurements, {} sigma points, lambda {:?}",
            x_len, y_len, par.s_len, par.lambda
        );

        Ok(UnscentedFilter {
            par,
            prev: Previous { u_p: u_prev, X_p },
            input: Input { u, y },
            predict: Prediction { X_m, Y_m, y_m, f: predict, h: observe },
            update: Update { Pyy, Pyy_cpy, Iyy, Pxy, K, x_corr, Pxx_corr },
            estimate,
        })
    }

    /// Advance the estimate by one cycle using the current input and measurement.
    ///
    /// The system input is carried over as the previous input of the next step, also when the cycle fails.
    /// A failed cycle leaves the estimate buffers in the phase of the failing stage, see the recovery operations.
    /// A cycle failure is reported in preference to an input cache failure. An input cache failure after a
    /// successful cycle is reported with the posterior already made.
    ///
    /// Return: reciprocal condition number estimate of the previous covariance
    pub fn step(&mut self) -> Result<N, StepError> {
        if self.estimate.phase != Phase::Posterior {
            return Err(StepError::Phase(self.estimate.phase));
        }

        let result = self.cycle();
        if let Err(err) = &result {
            log::warn!("estimation step failed in phase {:?}: {}", self.estimate.phase, err);
        }
        let carried = self.carry_input();
        if let Err(err) = &carried {
            log::warn!("system input not carried over: {}", err);
        }
        let rcond = result?;
        carried?;
        Ok(rcond)
    }

    fn cycle(&mut self) -> Result<N, StepError> {
        let rcond = sigma::generate(&self.par, &mut self.estimate, &mut self.prev.X_p)?;
        log::trace!("previous covariance rcond {:?}", rcond);

        predict::propagate(&self.par, &self.prev, &mut self.predict, &mut self.estimate);
        observe::observe(&self.par, &self.input, &mut self.predict, &mut self.estimate)?;
        observe::covariances(&self.par, &self.predict, &self.estimate, &mut self.update)?;
        update::correct(&mut self.input, &self.predict, &mut self.update, &mut self.estimate)?;
        Ok(rcond)
    }

    /// Previous input cache, only maintained when both inputs exist.
    fn carry_input(&mut self) -> Result<(), StepError> {
        if let (Some(u), Some(u_p)) = (&self.input.u, &mut self.prev.u_p) {
            linalg::copy(u_p, u).map_err(StepError::at(Stage::InputCache))?;
        }
        Ok(())
    }

    /// Restore the covariance to the initial covariance, keeping the state vector.
    ///
    /// Recovers from any failed step, in particular a covariance that is not positive definite.
    pub fn reset_covariance(&mut self) {
        self.estimate.Pxx.copy_from(&self.par.Pxx0);
        self.estimate.phase = Phase::Posterior;
    }

    /// Accept the predicted estimate as the posterior, skipping the failed measurement update.
    pub fn accept_prediction(&mut self) -> Result<(), StepError> {
        match self.estimate.phase {
            Phase::Predicted => {
                self.estimate.phase = Phase::Posterior;
                Ok(())
            }
            phase => Err(StepError::Phase(phase)),
        }
    }

    /// Reseed the state and covariance.
    pub fn reinitialise(&mut self, state: &KalmanState<N, D>) -> Result<(), InitError> {
        let x_len = self.par.x_len;
        let mut failures = Vec::new();
        if state.x.shape() != (x_len, 1) {
            failures.push(ShapeMismatch { field: Field::State, expected: (x_len, 1), found: Some(state.x.shape()) });
        }
        if state.X.shape() != (x_len, x_len) {
            failures.push(ShapeMismatch { field: Field::Covariance, expected: (x_len, x_len), found: Some(state.X.shape()) });
        }
        if !failures.is_empty() {
            return Err(InitError::Configuration(failures));
        }

        self.estimate.x.copy_from(&state.x);
        self.estimate.Pxx.copy_from(&state.X);
        self.estimate.phase = Phase::Posterior;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.estimate.phase
    }

    /// The state buffer, its meaning depends on the [`phase`](Self::phase).
    pub fn state(&self) -> &VectorN<N, D> {
        &self.estimate.x
    }

    /// The covariance buffer, its meaning depends on the [`phase`](Self::phase).
    pub fn covariance(&self) -> &MatrixN<N, D> {
        &self.estimate.Pxx
    }

    /// The posterior estimate, `None` unless the buffers are in the posterior phase.
    pub fn kalman_state(&self) -> Option<KalmanState<N, D>> {
        self.estimate.posterior().map(|(x, X)| KalmanState { x: x.clone(), X: X.clone() })
    }

    pub fn predicted_measurement(&self) -> &VectorN<N, ZD> {
        &self.predict.y_m
    }

    pub fn kalman_gain(&self) -> &MatrixMN<N, D, ZD> {
        &self.update.K
    }

    /// The innovation y - y_m of the last completed update.
    pub fn innovation(&self) -> &VectorN<N, ZD> {
        &self.input.y
    }

    pub fn sigma_points(&self) -> &SigmaPoints<N, D> {
        &self.prev.X_p
    }

    pub fn input(&self) -> &Input<N, ZD, UD> {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut Input<N, ZD, UD> {
        &mut self.input
    }

    pub fn parameters(&self) -> &Parameters<N, D, ZD> {
        &self.par
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScalingParameters, StateLimit};
    use crate::models::{observation, prediction};
    use crate::noise::CorrelatedNoise;
    use approx::assert_relative_eq;
    use na::{Matrix1, Vector1, U1};

    fn scalar_config(limits: Option<Vec<StateLimit<f64>>>) -> FilterConfig<f64, U1, U1, U1> {
        FilterConfig {
            scaling: ScalingParameters { alpha: 1.0, beta: 2.0, kappa: 0.0 },
            dt: 0.1,
            x0: Vector1::new(2.0),
            Pxx0: Matrix1::new(1.0),
            Qxx: CorrelatedNoise { Q: Matrix1::new(0.01) },
            Ryy0: CorrelatedNoise { Q: Matrix1::new(0.1) },
            limits,
            u: None,
            u_prev: None,
            y: Vector1::new(0.0),
            workspace: Workspace::new(U1, U1),
            predict: vec![prediction(|_u: Option<&Vector1<f64>>, x: &Vector1<f64>, _dt| 0.9 * x[0])],
            observe: vec![observation(|_u: Option<&Vector1<f64>>, x: &Vector1<f64>| x[0] * x[0])],
        }
    }

    #[test]
    fn correction_is_idle_when_measurement_matches_prediction() {
        let mut f = UnscentedFilter::new(scalar_config(None)).unwrap();

        sigma::generate(&f.par, &mut f.estimate, &mut f.prev.X_p).unwrap();
        predict::propagate(&f.par, &f.prev, &mut f.predict, &mut f.estimate);
        observe::observe(&f.par, &f.input, &mut f.predict, &mut f.estimate).unwrap();
        observe::covariances(&f.par, &f.predict, &f.estimate, &mut f.update).unwrap();
        assert_eq!(f.phase(), Phase::Predicted);

        let x_m = f.estimate.x.clone();
        let P_m = f.estimate.Pxx.clone();
        f.input.y.copy_from(&f.predict.y_m);
        update::correct(&mut f.input, &f.predict, &mut f.update, &mut f.estimate).unwrap();

        assert_eq!(f.phase(), Phase::Posterior);
        assert_relative_eq!(f.estimate.x, x_m, epsilon = 1e-12);
        assert_relative_eq!(f.innovation()[0], 0.0, epsilon = 1e-12);
        assert!(f.estimate.Pxx[(0, 0)] < P_m[(0, 0)]);
    }

    #[test]
    fn predicted_mean_of_linear_model() {
        let mut f = UnscentedFilter::new(scalar_config(None)).unwrap();
        sigma::generate(&f.par, &mut f.estimate, &mut f.prev.X_p).unwrap();
        predict::propagate(&f.par, &f.prev, &mut f.predict, &mut f.estimate);
        assert_eq!(f.phase(), Phase::PredictedMean);
        assert_relative_eq!(f.estimate.x[0], 1.8, epsilon = 1e-12);

        observe::observe(&f.par, &f.input, &mut f.predict, &mut f.estimate).unwrap();
        // 0.81 P + Q
        assert_relative_eq!(f.estimate.Pxx[(0, 0)], 0.82, epsilon = 1e-12);
        // E[x^2] = mean^2 + variance
        assert_relative_eq!(f.predict.y_m[0], 1.8 * 1.8 + 0.81, epsilon = 1e-12);
    }

    #[test]
    fn central_sigma_point_is_clamped_mean() {
        let limits = vec![StateLimit::new(-1.0, 1.0, 1e-6)];
        let mut f = UnscentedFilter::new(scalar_config(Some(limits))).unwrap();

        sigma::generate(&f.par, &mut f.estimate, &mut f.prev.X_p).unwrap();
        assert_eq!(f.sigma_points().len(), 3);
        assert_eq!(f.sigma_points()[0][0], 1.0);
        assert!(f.sigma_points().iter().all(|s| s[0] <= 1.0));
        // The estimate itself is not limited
        assert_eq!(f.estimate.x[0], 2.0);
    }

    #[test]
    fn narrow_limiter_is_disabled() {
        let limits = vec![StateLimit::new(0.0, 1e-9, 1e-3)];
        let f = UnscentedFilter::new(scalar_config(Some(limits))).unwrap();
        let limits = f.parameters().limits.as_ref().unwrap();
        assert!(!limits[0].enabled);
        assert_eq!(f.parameters().clamp(0, 5.0), 5.0);
    }

    #[test]
    fn step_needs_posterior() {
        let mut f = UnscentedFilter::new(scalar_config(None)).unwrap();
        f.estimate.phase = Phase::Predicted;
        assert_eq!(f.step(), Err(StepError::Phase(Phase::Predicted)));
        assert!(f.kalman_state().is_none());

        f.accept_prediction().unwrap();
        assert!(f.step().is_ok());
        assert!(f.accept_prediction().is_err());
    }

    #[test]
    fn rejects_bad_scaling() {
        let mut config = scalar_config(None);
        config.scaling.alpha = 0.0;
        match UnscentedFilter::new(config) {
            Err(InitError::Scaling { alpha, .. }) => assert_eq!(alpha, 0.0),
            _ => panic!("zero alpha accepted"),
        }
    }
}
