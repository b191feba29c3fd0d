///
/// unscented_estimate, additive noise Unscented Kalman Filter.
/// Copyright (c) 2026 The unscented_estimate developers
///
/// The Unscented Kalman Filter estimates the state of a nonlinear discrete time system. Instead of linearising the models
/// a deterministic set of sigma points is chosen to capture the mean and covariance of the state distribution.
/// The sigma points are propagated through the nonlinear models and the transformed mean and covariance recovered from them.
///
/// This library implements the additive noise form of the filter, where process and measurement noise enter the system by addition.
/// Every state and every output is driven by its own scalar model, so a system can be assembled from independent physical sub-models.
/// The filter works in a fixed set of caller supplied buffers, it validates their shapes once and never allocates while stepping.
//
/// # Licensing
///
/// All unscented_estimate source code files are copyright with the license conditions as given here. The copyright notice is that of the MIT license.
///
/// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
/// including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
/// and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
///
/// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
///
/// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
/// FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
/// WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

pub mod config;
pub mod error;
pub mod estimators;
pub mod linalg;
pub mod models;
pub mod noise;

pub use config::{FilterConfig, ScalingParameters, SigmaPoints, StateLimit, Workspace};
pub use error::{Field, InitError, ShapeMismatch, Stage, StepError};
pub use estimators::unscented::{Input, Parameters, Phase, UnscentedFilter};
pub use linalg::MatrixError;
