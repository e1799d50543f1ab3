//! Bounded week-over-week change for served forecasts

use crate::error::{ForecastError, Result};

/// Default largest relative change between consecutive served values
pub const DEFAULT_MAX_CHANGE: f64 = 0.05;

/// Clamp `raw` so each step moves at most `max_change` (relative) from the
/// step before it.
///
/// The first step is compared with `last_value`, the final observed price.
/// Every later step is compared with the previous *constrained* value, so a
/// steady trend can still compound by `max_change` per step.
///
/// # Errors
///
/// `InvalidArgument` if `max_change` is not a positive finite number, and
/// `InvalidState` once the running base is zero or negative, since a
/// relative change is undefined there.
///
/// ```
/// use price_forecast::constrain::constrain;
///
/// let out = constrain(100.0, &[120.0, 90.0], 0.05).unwrap();
/// assert_eq!(out.len(), 2);
/// assert!((out[0] - 105.0).abs() < 1e-9);
/// assert!((out[1] - 99.75).abs() < 1e-9);
/// ```
pub fn constrain(last_value: f64, raw: &[f64], max_change: f64) -> Result<Vec<f64>> {
    if !(max_change.is_finite() && max_change > 0.0) {
        return Err(ForecastError::InvalidArgument(format!(
            "max_change must be positive, got {}",
            max_change
        )));
    }

    let mut previous = last_value;
    let mut constrained = Vec::with_capacity(raw.len());

    for (step, &value) in raw.iter().enumerate() {
        if !(previous.is_finite() && previous > 0.0) {
            return Err(ForecastError::InvalidState(format!(
                "Cannot bound step {} against a base of {}",
                step + 1,
                previous
            )));
        }
        if !value.is_finite() {
            return Err(ForecastError::InvalidArgument(format!(
                "Non-finite forecast value {} at step {}",
                value,
                step + 1
            )));
        }

        let relative_change = (value - previous) / previous;
        let next = if relative_change.abs() > max_change {
            previous * (1.0 + max_change * relative_change.signum())
        } else {
            value
        };

        constrained.push(next);
        previous = next;
    }

    Ok(constrained)
}
