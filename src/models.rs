#![allow(non_snake_case)]

//! Estimation models.
//!
//! State representations are modeled as structs.
//! Prediction and observation models are traits evaluated for a single dimension and a single sigma point.
//! Each state and each output is driven by its own model, so a system can be assembled from disparate
//! physical sub-models. Models are held in sequences indexed by state or output number.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, RowVectorN, U1, VectorN};

/// Kalman State.
///
/// The mean and covariance form of an estimate, used to reseed a filter and to read back its posterior.
#[derive(PartialEq, Clone)]
pub struct KalmanState<N: RealField, D: Dim>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// State vector
    pub x: VectorN<N, D>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: MatrixN<N, D>,
}

impl<N: RealField, D: Dim> KalmanState<N, D>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    pub fn new_zero(d: D) -> KalmanState<N, D> {
        KalmanState {
            x: VectorN::zeros_generic(d, U1),
            X: MatrixN::zeros_generic(d, d),
        }
    }
}

/// The prediction model of one state.
///
/// Evaluated once per sigma point: `x` is a sigma point of the previous state distribution and
/// `u` the previous system input, if the system has one.
pub trait StateTransitionModel<N: RealField, D: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    /// The predicted value of the model's state.
    fn predict(&self, u: Option<&VectorN<N, UD>>, x: &VectorN<N, D>, dt: N) -> N;
}

/// The observation model of one output.
///
/// Evaluated once per predicted sigma point with the current system input.
pub trait ObservationModel<N: RealField, D: Dim, UD: Dim>
    where
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    /// The predicted value of the model's output.
    fn observe(&self, u: Option<&VectorN<N, UD>>, x: &VectorN<N, D>) -> N;
}

impl<N, D, UD, F> StateTransitionModel<N, D, UD> for F
    where
        N: RealField,
        D: Dim,
        UD: Dim,
        F: Fn(Option<&VectorN<N, UD>>, &VectorN<N, D>, N) -> N,
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    fn predict(&self, u: Option<&VectorN<N, UD>>, x: &VectorN<N, D>, dt: N) -> N {
        self(u, x, dt)
    }
}

impl<N, D, UD, F> ObservationModel<N, D, UD> for F
    where
        N: RealField,
        D: Dim,
        UD: Dim,
        F: Fn(Option<&VectorN<N, UD>>, &VectorN<N, D>) -> N,
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    fn observe(&self, u: Option<&VectorN<N, UD>>, x: &VectorN<N, D>) -> N {
        self(u, x)
    }
}

/// Per state prediction models. A `None` entry propagates the sigma point coordinate unchanged.
pub type PredictionModels<N, D, UD> = Vec<Option<Box<dyn StateTransitionModel<N, D, UD>>>>;

/// Per output observation models. A `None` entry observes a fixed zero response.
pub type ObservationModels<N, D, UD> = Vec<Option<Box<dyn ObservationModel<N, D, UD>>>>;

/// Box a prediction function as the model of one state.
pub fn prediction<N, D, UD, F>(f: F) -> Option<Box<dyn StateTransitionModel<N, D, UD>>>
    where
        N: RealField,
        D: Dim,
        UD: Dim,
        F: Fn(Option<&VectorN<N, UD>>, &VectorN<N, D>, N) -> N + 'static,
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    Some(Box::new(f))
}

/// Box an observation function as the model of one output.
pub fn observation<N, D, UD, F>(f: F) -> Option<Box<dyn ObservationModel<N, D, UD>>>
    where
        N: RealField,
        D: Dim,
        UD: Dim,
        F: Fn(Option<&VectorN<N, UD>>, &VectorN<N, D>) -> N + 'static,
        DefaultAllocator: Allocator<N, D> + Allocator<N, UD>,
{
    Some(Box::new(f))
}

/// Linear prediction model.
///
/// Prediction is represented by a state transition matrix.
pub struct LinearPredictModel<N: RealField, D: Dim>
    where
        DefaultAllocator: Allocator<N, D, D>,
{
    /// State transition matrix
    pub Fx: MatrixN<N, D>,
}

/// Linear observation model.
///
/// Observation is represented by an observation matrix.
pub struct LinearObserveModel<N: RealField, D: Dim, ZD: Dim>
    where
        DefaultAllocator: Allocator<N, ZD, D>,
{
    /// Observation matrix
    pub Hx: MatrixMN<N, ZD, D>,
}

/// One row of a linear model.
struct LinearRow<N: RealField, D: Dim>
    where
        DefaultAllocator: Allocator<N, U1, D>,
{
    row: RowVectorN<N, D>,
}

impl<N: RealField, D: Dim> LinearRow<N, D>
    where
        DefaultAllocator: Allocator<N, U1, D> + Allocator<N, D>,
{
    fn dot(&self, x: &VectorN<N, D>) -> N {
        let mut e = N::zero();
        for (a, b) in self.row.iter().zip(x.iter()) {
            e += *a * *b;
        }
        e
    }
}

impl<N: RealField, D: Dim, UD: Dim> StateTransitionModel<N, D, UD> for LinearRow<N, D>
    where
        DefaultAllocator: Allocator<N, U1, D> + Allocator<N, D> + Allocator<N, UD>,
{
    fn predict(&self, _u: Option<&VectorN<N, UD>>, x: &VectorN<N, D>, _dt: N) -> N {
        self.dot(x)
    }
}

impl<N: RealField, D: Dim, UD: Dim> ObservationModel<N, D, UD> for LinearRow<N, D>
    where
        DefaultAllocator: Allocator<N, U1, D> + Allocator<N, D> + Allocator<N, UD>,
{
    fn observe(&self, _u: Option<&VectorN<N, UD>>, x: &VectorN<N, D>) -> N {
        self.dot(x)
    }
}

impl<N: RealField, D: Dim> LinearPredictModel<N, D>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, U1, D> + Allocator<N, D>,
{
    /// The per state models, row i of Fx predicts state i.
    pub fn state_models<UD: Dim>(&self) -> PredictionModels<N, D, UD>
        where
            DefaultAllocator: Allocator<N, UD>,
    {
        (0..self.Fx.nrows())
            .map(|i| {
                let model: Box<dyn StateTransitionModel<N, D, UD>> = Box::new(LinearRow { row: self.Fx.row(i).clone_owned() });
                Some(model)
            })
            .collect()
    }
}

impl<N: RealField, D: Dim, ZD: Dim> LinearObserveModel<N, D, ZD>
    where
        DefaultAllocator: Allocator<N, ZD, D> + Allocator<N, U1, D> + Allocator<N, D>,
{
    /// The per output models, row i of Hx observes output i.
    pub fn output_models<UD: Dim>(&self) -> ObservationModels<N, D, UD>
        where
            DefaultAllocator: Allocator<N, UD>,
    {
        (0..self.Hx.nrows())
            .map(|i| {
                let model: Box<dyn ObservationModel<N, D, UD>> = Box::new(LinearRow { row: self.Hx.row(i).clone_owned() });
                Some(model)
            })
            .collect()
    }
}
