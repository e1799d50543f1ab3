//! Error types for the price_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Unknown product slug or missing model bundle
    #[error("Not found: {0}")]
    NotFound(String),

    /// Argument outside its valid range (split coefficient, horizon, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Series too short for the fixed seasonal period
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Numerical failure while estimating the model
    #[error("Model fit failed: {0}")]
    ModelFitFailed(String),

    /// Operation cannot proceed from the current state (e.g. zero clamp base)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A bounded operation ran past its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Error related to data loading or shape
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from (de)serializing a model bundle
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error from parsing dates
    #[error("Parse error: {0}")]
    ParseError(#[from] chrono::ParseError),

    /// Error from loading configuration
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl ForecastError {
    /// Stable short label for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::NotFound(_) => "not_found",
            ForecastError::InvalidArgument(_) => "invalid_argument",
            ForecastError::InsufficientData { .. } => "insufficient_data",
            ForecastError::ModelFitFailed(_) => "model_fit_failed",
            ForecastError::InvalidState(_) => "invalid_state",
            ForecastError::Timeout(_) => "timeout",
            ForecastError::DataError(_) => "data_error",
            ForecastError::IoError(_) => "io_error",
            ForecastError::PolarsError(_) => "polars_error",
            ForecastError::SerializationError(_) => "serialization_error",
            ForecastError::ParseError(_) => "parse_error",
            ForecastError::ConfigError(_) => "config_error",
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InsufficientData(msg) => ForecastError::DataError(msg),
            MathError::InvalidInput(msg) => ForecastError::InvalidArgument(msg),
            MathError::NotConverged { .. } | MathError::CalculationError(_) => {
                ForecastError::ModelFitFailed(err.to_string())
            }
            MathError::DeadlineExceeded { .. } => ForecastError::Timeout(err.to_string()),
        }
    }
}
