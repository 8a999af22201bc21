//! Score regression model

pub mod estimator;
pub mod net;
pub mod regressor;
pub mod validation;

pub use estimator::{FeatureMatrix, FitReport, ScoreEstimator};
pub use regressor::MlpRegressor;
