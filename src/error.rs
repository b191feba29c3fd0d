//! Error types of the filter.
//!
//! Configuration errors are found once, when the filter is constructed, and report every failing field.
//! Numerical errors are found while stepping and name the stage and the operation that failed,
//! so the caller can choose a recovery policy.

use std::fmt;

use thiserror::Error;

use crate::estimators::unscented::Phase;
use crate::linalg::MatrixError;

/// A configuration role checked by the dimension validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    SystemInput,
    PreviousSystemInput,
    Measurement,
    MeanWeights,
    CovarianceWeights,
    InitialState,
    InitialCovariance,
    ProcessNoise,
    MeasurementNoise,
    State,
    Covariance,
    PreviousSigmaPoints,
    PredictedSigmaPoints,
    MeasurementSigmaPoints,
    PredictedMeasurement,
    MeasurementCovariance,
    MeasurementCovarianceCopy,
    IdentityScratch,
    CrossCovariance,
    KalmanGain,
    StateCorrection,
    CovarianceCorrection,
    StateLimits,
    PredictionModels,
    ObservationModels,
}

/// One failed shape check.
///
/// `found` is `None` when a mandatory field was not supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub field: Field,
    pub expected: (usize, usize),
    pub found: Option<(usize, usize)>,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some((r, c)) => write!(f, "{:?} is {}x{}, expected {}x{}", self.field, r, c, self.expected.0, self.expected.1),
            None => write!(f, "{:?} is missing, expected {}x{}", self.field, self.expected.0, self.expected.1),
        }
    }
}

fn join(mismatches: &[ShapeMismatch]) -> String {
    mismatches.iter().map(|m| m.to_string()).collect::<Vec<_>>().join("; ")
}

/// Filter construction failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    #[error("configuration rejected: {}", join(.0))]
    Configuration(Vec<ShapeMismatch>),

    #[error("scaling parameters give alpha = {alpha}, xLen + lambda = {spread}, both must be positive")]
    Scaling { alpha: f64, spread: f64 },
}

/// The stage of an estimation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Observation,
    Covariance,
    Correction,
    /// Carrying the system input over to the next step.
    InputCache,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Observation => "observation",
            Stage::Covariance => "covariance",
            Stage::Correction => "correction",
            Stage::InputCache => "input cache",
        };
        f.write_str(name)
    }
}

/// Estimation step failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// Cholesky factorisation of the previous covariance failed, no sigma points were generated.
    #[error("previous covariance could not be factorised")]
    SigmaPoints(#[source] MatrixError),

    /// The predicted measurement covariance Pyy could not be inverted, no correction was made.
    #[error("predicted measurement covariance could not be inverted")]
    InnovationCovariance(#[source] MatrixError),

    #[error("{stage} stage matrix operation failed")]
    Matrix {
        stage: Stage,
        #[source]
        source: MatrixError,
    },

    /// A step was requested while the estimate buffers do not hold a posterior estimate.
    #[error("estimate buffers are in the {0:?} phase, a posterior estimate is required")]
    Phase(Phase),
}

impl StepError {
    pub(crate) fn at(stage: Stage) -> impl Fn(MatrixError) -> StepError {
        move |source| StepError::Matrix { stage, source }
    }
}
