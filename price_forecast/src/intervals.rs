//! Confidence bands for forecasts and in-sample fits
//!
//! Two estimators are provided:
//! - a parametric forecast band whose variance grows linearly with the step,
//!   `se_i = sqrt(mean(residual²) · (1 + i))`
//! - a robust in-sample band scaled by the median absolute deviation of the
//!   residuals and skewed by their medcouple
//!
//! Only the width summaries are persisted with a model bundle.

use crate::error::{ForecastError, Result};
use crate::models::FittedModel;
use forecast_math::{max, mean, medcouple, median_absolute_deviation};
use serde::{Deserialize, Serialize};

/// Two-sided 95% normal quantile
pub const Z_95: f64 = 1.96;

/// Pointwise lower and upper bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Mean and maximum width of a band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    pub avg_width: f64,
    pub max_width: f64,
}

impl Interval {
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// `upper - lower` at every point
    pub fn widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(self.lower.iter())
            .map(|(u, l)| u - l)
            .collect()
    }

    /// Average and widest band width
    pub fn summarize(&self) -> Result<IntervalSummary> {
        let widths = self.widths();
        Ok(IntervalSummary {
            avg_width: mean(&widths)?,
            max_width: max(&widths)?,
        })
    }
}

/// Mean squared residual of a fit
fn residual_variance(residuals: &[f64]) -> Result<f64> {
    let squared: Vec<f64> = residuals.iter().map(|r| r * r).collect();
    Ok(mean(&squared)?)
}

/// Parametric band around arbitrary forecast values, using the residual
/// variance of the fit that produced them.
pub fn forecast_band(center: &[f64], residuals: &[f64]) -> Result<Interval> {
    let variance = residual_variance(residuals)?;

    let (lower, upper) = center
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let step = (i + 1) as f64;
            let half_width = Z_95 * (variance * (1.0 + step)).sqrt();
            (value - half_width, value + half_width)
        })
        .unzip();

    Ok(Interval { lower, upper })
}

/// Band around the model's own `horizon`-step forecast
pub fn forecast_interval<M: FittedModel + ?Sized>(model: &M, horizon: usize) -> Result<Interval> {
    let forecast = model.forecast(horizon)?;
    forecast_band(&forecast, model.residuals())
}

/// Robust, skew-adjusted band around the fitted values.
///
/// Points with a negative residual get a lower bound stretched by
/// `exp(-mc)`; points with a positive residual get an upper bound stretched
/// by `exp(mc)`. The opposite side uses the unskewed half-width.
pub fn in_sample_interval<M: FittedModel + ?Sized>(model: &M) -> Result<Interval> {
    let fitted = model.fitted_values();
    let residuals = model.residuals();
    if fitted.len() != residuals.len() {
        return Err(ForecastError::InvalidState(format!(
            "{} fitted values but {} residuals",
            fitted.len(),
            residuals.len()
        )));
    }

    let scale = median_absolute_deviation(residuals)?;
    let mc = medcouple(residuals)?;
    let half_width = Z_95 * scale;

    let (lower, upper) = fitted
        .iter()
        .zip(residuals.iter())
        .map(|(&f, &r)| {
            let lower = if r < 0.0 {
                f - half_width * (-mc).exp()
            } else {
                f - half_width
            };
            let upper = if r > 0.0 {
                f + half_width * mc.exp()
            } else {
                f + half_width
            };
            (lower, upper)
        })
        .unzip();

    Ok(Interval { lower, upper })
}
