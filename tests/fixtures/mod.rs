//! Filter configurations shared by the unscented filter tests.
//!
//! Configurations are generic in the state dimension so they are tested with Dynamic matrices and matrices
//! with fixed dimensions.

#![allow(dead_code)]

use na::{allocator::Allocator, DefaultAllocator, Dim, U1};
use na::{MatrixMN, MatrixN, Vector1, VectorN};
use nalgebra as na;

use unscented_estimate::config::{FilterConfig, ScalingParameters, Workspace};
use unscented_estimate::models::{LinearObserveModel, LinearPredictModel};
use unscented_estimate::noise::CorrelatedNoise;

pub const DT: f64 = 0.01;
// Velocity noise, giving mean squared error bound
pub const V_NOISE: f64 = 0.1;
// Velocity correlation, giving velocity change time constant
pub const V_GAMMA: f64 = 1.;
// Filter's Initial state uncertainty
pub const I_P_NOISE: f64 = 2.;
pub const I_V_NOISE: f64 = 1.;
// Noise on observing system state
pub const OBS_NOISE: f64 = 0.01;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn scaling() -> ScalingParameters<f64> {
    ScalingParameters { alpha: 1., beta: 2., kappa: 0. }
}

fn sqr(x: f64) -> f64 {
    x * x
}

/// The constant velocity system as matrices: state transition, observation, process noise,
/// observation noise and initial covariance.
pub struct ConstantVelocity {
    pub fx: [f64; 4],
    pub hx: [f64; 2],
    pub q: [f64; 4],
    pub r: f64,
    pub p0: [f64; 4],
}

pub fn constant_velocity() -> ConstantVelocity {
    let gv = (-DT * V_GAMMA).exp();
    // Velocity noise coupled into position by DT
    let q = sqr(V_NOISE) * DT;
    ConstantVelocity {
        fx: [1., DT, 0., gv],
        hx: [1., 0.],
        q: [sqr(DT) * q, DT * q, DT * q, q],
        r: sqr(OBS_NOISE),
        p0: [sqr(I_P_NOISE), 0., 0., sqr(I_V_NOISE)],
    }
}

/// Position and velocity tracked by observing position, with linear models.
pub fn constant_velocity_config<D: Dim>(d: D) -> FilterConfig<f64, D, U1, U1>
    where
        DefaultAllocator: Allocator<f64, D, D> + Allocator<f64, D> + Allocator<f64, U1, D> + Allocator<f64, U1, U1>,
{
    let sys = constant_velocity();
    let predict = LinearPredictModel { Fx: MatrixN::<f64, D>::from_row_slice_generic(d, d, &sys.fx) };
    let observe = LinearObserveModel { Hx: MatrixMN::<f64, U1, D>::from_row_slice_generic(U1, d, &sys.hx) };

    FilterConfig {
        scaling: scaling(),
        dt: DT,
        x0: VectorN::<f64, D>::zeros_generic(d, U1),
        Pxx0: MatrixN::<f64, D>::from_row_slice_generic(d, d, &sys.p0),
        Qxx: CorrelatedNoise { Q: MatrixN::<f64, D>::from_row_slice_generic(d, d, &sys.q) },
        Ryy0: CorrelatedNoise { Q: MatrixN::<f64, U1>::new(sys.r) },
        limits: None,
        u: None,
        u_prev: None,
        y: Vector1::zeros(),
        workspace: Workspace::new(d, U1),
        predict: predict.state_models(),
        observe: observe.output_models(),
    }
}
