//! Development/test partitioning of a series by calendar span

use crate::config::validate_split_coefficient;
use crate::data::Series;
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use tracing::info;

/// A series cut at `split_date`: `dev` holds every observation on or before
/// it, `test` the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub dev: Series,
    pub test: Series,
    pub split_date: NaiveDate,
}

/// Splits a series so the last `coefficient` share of its calendar span
/// becomes the test window.
///
/// The boundary is measured in days rather than observations, so gaps in
/// the sampling do not shift the fraction.
pub fn split(series: &Series, coefficient: f64) -> Result<SplitResult> {
    validate_split_coefficient(coefficient)?;

    let (start, _) = series.first();
    let span = series.day_span();
    let offset = ((1.0 - coefficient) * span as f64).floor() as i64;
    let split_date = start + Duration::days(offset);

    let (dev_points, test_points) = series.partition_at(split_date);
    info!(
        product = series.product(),
        %split_date,
        dev_len = dev_points.len(),
        test_len = test_points.len(),
        "Split series"
    );

    if test_points.is_empty() {
        // Only a single-observation series has an empty test window
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }

    Ok(SplitResult {
        dev: Series::new(series.product(), dev_points)?,
        test: Series::new(series.product(), test_points)?,
        split_date,
    })
}
