//! Engine configuration
//!
//! Values come from built-in defaults, then an optional config file, then
//! environment variables prefixed `PRICE_FORECAST__` (for example
//! `PRICE_FORECAST__MODELS_DIR=/var/lib/models`).

use crate::error::{ForecastError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Smallest distance a split coefficient may keep from 0 and 1
pub const SPLIT_EPSILON: f64 = 0.001;

const ENV_PREFIX: &str = "PRICE_FORECAST";

/// Runtime settings for training and serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one serialized bundle per product
    pub models_dir: PathBuf,
    /// Long-format `Product,Date,Price` CSV produced by the cleaning step
    pub data_file: PathBuf,
    /// Fraction of the calendar span held out for testing
    pub split_coefficient: f64,
    /// Number of weekly steps served per forecast
    pub horizon: usize,
    /// Largest allowed week-over-week relative change of a served forecast
    pub max_change: f64,
    /// Seasonal period of the Holt-Winters model
    pub seasonal_period: usize,
    /// Number of concurrent training workers
    pub workers: usize,
    /// Upper bound on a single model fit
    pub fit_timeout_secs: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models/trained_models"),
            data_file: PathBuf::from("data/price_data_long.csv"),
            split_coefficient: 0.15,
            horizon: 28,
            max_change: 0.05,
            seasonal_period: 12,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            fit_timeout_secs: 30,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_split_coefficient(self.split_coefficient)?;
        if self.horizon == 0 {
            return Err(ForecastError::InvalidArgument(
                "horizon must be positive".to_string(),
            ));
        }
        if !(self.max_change.is_finite() && self.max_change > 0.0) {
            return Err(ForecastError::InvalidArgument(format!(
                "max_change must be positive, got {}",
                self.max_change
            )));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::InvalidArgument(format!(
                "seasonal_period must be at least 2, got {}",
                self.seasonal_period
            )));
        }
        if self.workers == 0 {
            return Err(ForecastError::InvalidArgument(
                "workers must be positive".to_string(),
            ));
        }
        if self.fit_timeout_secs == 0 {
            return Err(ForecastError::InvalidArgument(
                "fit_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split coefficients must lie in `(SPLIT_EPSILON, 1 - SPLIT_EPSILON)`
pub fn validate_split_coefficient(coefficient: f64) -> Result<()> {
    if !coefficient.is_finite()
        || coefficient <= SPLIT_EPSILON
        || coefficient >= 1.0 - SPLIT_EPSILON
    {
        return Err(ForecastError::InvalidArgument(format!(
            "split coefficient must be between {} and {}, got {}",
            SPLIT_EPSILON,
            1.0 - SPLIT_EPSILON,
            coefficient
        )));
    }
    Ok(())
}
