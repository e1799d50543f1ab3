//! # Price Index Forecast
//!
//! Workspace facade re-exporting the member crates:
//!
//! - [`forecast_math`]: robust statistics, error metrics and the bounded
//!   Nelder-Mead minimiser
//! - [`price_forecast`]: datasets, Holt-Winters models, intervals, the model
//!   store and the training/serving engine
//!
//! ## Example
//!
//! ```
//! use price_index_forecast_workspace::price_forecast::slug::slugify;
//!
//! assert_eq!(slugify("Молоко, л"), "moloko-l");
//! ```

pub use forecast_math;
pub use price_forecast;
