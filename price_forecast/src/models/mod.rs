//! Forecasting models for price index series

use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use forecast_math::{mean_absolute_error, root_mean_squared_error};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Served forecast: one date, value and band per step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    lower_ci: Vec<f64>,
    upper_ci: Vec<f64>,
}

impl ForecastResult {
    /// Create a new forecast result, checking every column has the same length
    pub fn new(
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        lower_ci: Vec<f64>,
        upper_ci: Vec<f64>,
    ) -> Result<Self> {
        let horizon = dates.len();
        for (name, len) in [
            ("values", values.len()),
            ("lower_ci", lower_ci.len()),
            ("upper_ci", upper_ci.len()),
        ] {
            if len != horizon {
                return Err(ForecastError::InvalidArgument(format!(
                    "{} length ({}) doesn't match horizon ({})",
                    name, len, horizon
                )));
            }
        }

        Ok(Self {
            dates,
            values,
            lower_ci,
            upper_ci,
        })
    }

    /// Get the number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn lower_ci(&self) -> &[f64] {
        &self.lower_ci
    }

    pub fn upper_ci(&self) -> &[f64] {
        &self.upper_ci
    }
}

/// In-sample and out-of-sample accuracy of a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// MAE of the fitted values against the training series
    pub train_mae: Option<f64>,
    /// MAE of an out-of-sample forecast against the test series
    pub test_mae: Option<f64>,
}

/// Capabilities of a trained model. The estimator behind it stays opaque.
pub trait FittedModel: Debug + Send + Sync {
    /// Point forecast for the next `horizon` periods after the training data
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;

    /// One-step-ahead reconstruction of the training data
    fn fitted_values(&self) -> &[f64];

    /// `actual - fitted` for every training observation
    fn residuals(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> String;
}

/// A model specification that can be fitted to a series
pub trait Forecaster: Debug + Clone {
    /// The type of trained model produced
    type Fitted: FittedModel;

    /// Fit the model to a development series
    fn fit(&self, series: &Series) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> String;
}

/// Score a fitted model on the data it was trained on and on held-out data
pub fn evaluate<M: FittedModel + ?Sized>(
    model: &M,
    train: &Series,
    test: Option<&Series>,
) -> Result<Evaluation> {
    let train_mae = mean_absolute_error(train.values(), model.fitted_values())?;

    let test_mae = match test {
        Some(test) => {
            let forecast = model.forecast(test.len())?;
            Some(mean_absolute_error(test.values(), &forecast)?)
        }
        None => None,
    };

    Ok(Evaluation {
        train_mae: Some(train_mae),
        test_mae,
    })
}

/// RMSE between the overlapping tail of the fitted values and `series`
pub fn rmse<M: FittedModel + ?Sized>(model: &M, series: &Series) -> Result<f64> {
    Ok(root_mean_squared_error(
        series.values(),
        model.fitted_values(),
    )?)
}

pub mod holt_winters;

pub use holt_winters::{FittedHoltWinters, HoltWinters};
