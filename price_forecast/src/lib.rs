//! # Price Forecast
//!
//! Per-product forecasting of weekly price indices.
//!
//! ## Features
//!
//! - Long-format `Product,Date,Price` datasets loaded with Polars
//! - Calendar-span development/test splitting
//! - Additive Holt-Winters models with a fixed seasonal period
//! - Forecasts bounded to a maximum week-over-week change
//! - Parametric forecast bands and robust (MAD/medcouple) in-sample bands
//! - One persisted model bundle per product slug
//! - Concurrent, failure-isolated training runs
//!
//! ## Quick Start
//!
//! ```no_run
//! use price_forecast::config::EngineConfig;
//! use price_forecast::data::{Dataset, SeriesRepository};
//! use price_forecast::engine::ForecastEngine;
//!
//! # async fn run() -> price_forecast::error::Result<()> {
//! let config = EngineConfig::load(None)?;
//! let dataset = Dataset::from_csv(&config.data_file)?;
//!
//! let engine = ForecastEngine::from_config(config.clone())?
//!     .with_repository(SeriesRepository::new(dataset.clone()));
//!
//! // Fit and store one model per product
//! let report = engine.train_all(&dataset, config.split_coefficient).await?;
//! println!("{} trained, {} failed", report.success_count(), report.failure_count());
//!
//! // Serve 28 weeks for one product
//! let served = engine.serve("hleb-rzhanoi-kg", config.horizon)?;
//! println!("{:?}", served.forecast.values());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constrain;
pub mod data;
pub mod engine;
pub mod error;
pub mod intervals;
pub mod models;
pub mod slug;
pub mod split;
pub mod store;
pub mod telemetry;

pub use config::EngineConfig;
pub use data::{Dataset, Observation, Series, SeriesRepository};
pub use engine::{ForecastEngine, ServedForecast, TrainingReport, TrainingWindow};
pub use error::{ForecastError, Result};
pub use models::{FittedModel, ForecastResult, Forecaster, HoltWinters};
pub use store::{ModelBundle, ModelStore};
