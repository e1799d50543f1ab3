//! # Forecast Math
//!
//! Numeric building blocks for the price index forecasting engine.
//! This crate provides robust location/scale/skew statistics, point forecast
//! error metrics and a bounded Nelder-Mead minimiser used to fit smoothing
//! parameters.

use thiserror::Error;

pub mod accuracy;
pub mod optimize;
pub mod robust;

pub use accuracy::{mean_absolute_error, mean_squared_error, root_mean_squared_error};
pub use optimize::{nelder_mead, NelderMeadConfig, NelderMeadOutcome};
pub use robust::{max, mean, medcouple, median, median_absolute_deviation};

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("Deadline exceeded after {iterations} iterations")]
    DeadlineExceeded { iterations: usize },

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
