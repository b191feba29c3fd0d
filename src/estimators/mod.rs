//! Bayesian state estimators.

pub mod unscented;
