//! Additive Holt-Winters (triple exponential smoothing)
//!
//! Model equations, with seasonal period `m`:
//! - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
//! - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
//! - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
//! - Forecast: `ŷ_{t+h} = l_t + h·b_t + s_{t+h-m}`
//!
//! Trend and seasonal types and the period are fixed by construction; only
//! the smoothing parameters are estimated, by minimising the one-step-ahead
//! sum of squared errors.

use crate::data::Series;
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, Forecaster};
use forecast_math::{nelder_mead, NelderMeadConfig};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default seasonal period (weeks per cycle in the price index data)
pub const DEFAULT_SEASONAL_PERIOD: usize = 12;

const PARAM_BOUNDS: [(f64, f64); 3] = [(1e-4, 1.0 - 1e-4); 3];
const INITIAL_PARAMS: [f64; 3] = [0.3, 0.1, 0.1];

/// Holt-Winters model specification
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Seasonal period
    seasonal_period: usize,
    /// Upper bound on one fit
    timeout: Option<Duration>,
    /// Simplex iteration budget
    max_iter: usize,
}

/// Trained Holt-Winters model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedHoltWinters {
    alpha: f64,
    beta: f64,
    gamma: f64,
    seasonal_period: usize,
    /// Level after the last training observation
    level: f64,
    /// Trend after the last training observation
    trend: f64,
    /// Latest seasonal index per phase, indexed by `t % seasonal_period`
    seasonals: Vec<f64>,
    /// Number of training observations
    n: usize,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    sse: f64,
}

/// Recursion output for one parameter set
struct SmoothingPass {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

impl HoltWinters {
    /// Create a new model with the given seasonal period
    pub fn new(seasonal_period: usize) -> Result<Self> {
        if seasonal_period < 2 {
            return Err(ForecastError::InvalidArgument(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal_period
            )));
        }

        Ok(Self {
            seasonal_period,
            timeout: None,
            max_iter: 5000,
        })
    }

    /// Bound the duration of each fit
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the optimiser iteration budget
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Smallest series this model will fit
    pub fn min_observations(&self) -> usize {
        2 * self.seasonal_period
    }

    /// Level, trend and seasonal indices from the first two seasons
    fn initial_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
        let first_mean = values[..period].iter().sum::<f64>() / period as f64;
        let second_mean = values[period..2 * period].iter().sum::<f64>() / period as f64;
        let trend = (second_mean - first_mean) / period as f64;

        let mut seasonals: Vec<f64> = values[..period].iter().map(|y| y - first_mean).collect();
        let adjustment = seasonals.iter().sum::<f64>() / period as f64;
        for s in seasonals.iter_mut() {
            *s -= adjustment;
        }

        (first_mean, trend, seasonals)
    }

    fn smooth(values: &[f64], period: usize, alpha: f64, beta: f64, gamma: f64) -> SmoothingPass {
        let (mut level, mut trend, mut seasonals) = Self::initial_state(values, period);
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let phase = t % period;
            let s = seasonals[phase];
            let prediction = level + trend + s;
            fitted.push(prediction);
            sse += (y - prediction).powi(2);

            let previous_level = level;
            level = alpha * (y - s) + (1.0 - alpha) * (previous_level + trend);
            trend = beta * (level - previous_level) + (1.0 - beta) * trend;
            seasonals[phase] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        SmoothingPass {
            level,
            trend,
            seasonals,
            fitted,
            sse,
        }
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self {
            seasonal_period: DEFAULT_SEASONAL_PERIOD,
            timeout: None,
            max_iter: 5000,
        }
    }
}

impl Forecaster for HoltWinters {
    type Fitted = FittedHoltWinters;

    fn fit(&self, series: &Series) -> Result<Self::Fitted> {
        let values = series.values();
        let period = self.seasonal_period;
        if values.len() < self.min_observations() {
            return Err(ForecastError::InsufficientData {
                needed: self.min_observations(),
                got: values.len(),
            });
        }

        let config = NelderMeadConfig {
            max_iter: self.max_iter,
            deadline: self.timeout.map(|t| Instant::now() + t),
            ..Default::default()
        };
        let outcome = nelder_mead(
            |p| Self::smooth(values, period, p[0], p[1], p[2]).sse,
            &INITIAL_PARAMS,
            Some(&PARAM_BOUNDS[..]),
            config,
        )?;

        let [alpha, beta, gamma] = [
            outcome.optimal_point[0],
            outcome.optimal_point[1],
            outcome.optimal_point[2],
        ];
        let pass = Self::smooth(values, period, alpha, beta, gamma);

        let state_is_finite = pass.level.is_finite()
            && pass.trend.is_finite()
            && pass.sse.is_finite()
            && pass.seasonals.iter().all(|s| s.is_finite());
        if !state_is_finite {
            return Err(ForecastError::ModelFitFailed(format!(
                "Non-finite smoothing state for '{}'",
                series.product()
            )));
        }

        debug!(
            product = series.product(),
            alpha,
            beta,
            gamma,
            sse = pass.sse,
            iterations = outcome.iterations,
            "Fitted Holt-Winters"
        );

        let residuals = values
            .iter()
            .zip(pass.fitted.iter())
            .map(|(y, f)| y - f)
            .collect();

        Ok(FittedHoltWinters {
            alpha,
            beta,
            gamma,
            seasonal_period: period,
            level: pass.level,
            trend: pass.trend,
            seasonals: pass.seasonals,
            n: values.len(),
            fitted: pass.fitted,
            residuals,
            sse: pass.sse,
        })
    }

    fn name(&self) -> String {
        format!("Holt-Winters (additive, period={})", self.seasonal_period)
    }
}

impl FittedHoltWinters {
    /// Smoothing parameters `(alpha, beta, gamma)`
    pub fn params(&self) -> (f64, f64, f64) {
        (self.alpha, self.beta, self.gamma)
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Sum of squared one-step-ahead errors on the training data
    pub fn sse(&self) -> f64 {
        self.sse
    }
}

impl FittedModel for FittedHoltWinters {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidArgument(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        if self.n == 0 || self.seasonals.len() != self.seasonal_period {
            return Err(ForecastError::InvalidState(format!(
                "Corrupt model state: n={}, {} seasonal indices for period {}",
                self.n,
                self.seasonals.len(),
                self.seasonal_period
            )));
        }

        Ok((1..=horizon)
            .map(|h| {
                let phase = (self.n - 1 + h) % self.seasonal_period;
                self.level + h as f64 * self.trend + self.seasonals[phase]
            })
            .collect())
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> String {
        format!(
            "Holt-Winters (additive, period={}, alpha={:.3}, beta={:.3}, gamma={:.3})",
            self.seasonal_period, self.alpha, self.beta, self.gamma
        )
    }
}
