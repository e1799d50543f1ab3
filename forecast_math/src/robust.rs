//! Robust statistics for residual analysis
//!
//! Contains the location, scale and skewness estimators used to build
//! outlier-resistant confidence bands:
//! - Median
//! - Median absolute deviation
//! - Medcouple (robust skewness)

use crate::{MathError, Result};
use statrs::statistics::{Data, Median};
use std::cmp::Ordering;

fn check_finite(values: &[f64], what: &str) -> Result<()> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(format!(
            "{} requires at least one value",
            what
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(format!(
            "{} requires finite values",
            what
        )));
    }
    Ok(())
}

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    check_finite(values, "Mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Largest value of a non-empty slice
pub fn max(values: &[f64]) -> Result<f64> {
    check_finite(values, "Max")?;
    Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Median of a non-empty slice. Even-length input averages the two middle values.
pub fn median(values: &[f64]) -> Result<f64> {
    check_finite(values, "Median")?;
    Ok(Data::new(values.to_vec()).median())
}

/// Median absolute deviation: `median(|x - median(x)|)`, unscaled.
pub fn median_absolute_deviation(values: &[f64]) -> Result<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Medcouple of a sample, a robust skewness measure in `[-1, 1]`.
///
/// For every pair `(x_i, x_j)` with `x_i >= m >= x_j` (where `m` is the
/// sample median) the kernel is
/// `h(x_i, x_j) = ((x_i - m) - (m - x_j)) / (x_i - x_j)`.
/// Pairs where both values equal the median use the sign kernel so that ties
/// at the median do not bias the estimate. The medcouple is the median of all
/// kernel values.
///
/// This is the exact quadratic algorithm; residual samples here are a few
/// hundred points at most.
pub fn medcouple(values: &[f64]) -> Result<f64> {
    check_finite(values, "Medcouple")?;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let center = median(&sorted)?;

    // Centered values; `lower` ascending (most negative first), `upper` ascending (zeros first)
    let lower: Vec<f64> = sorted.iter().map(|v| v - center).filter(|z| *z <= 0.0).collect();
    let upper: Vec<f64> = sorted.iter().map(|v| v - center).filter(|z| *z >= 0.0).collect();

    let ties = lower.iter().filter(|z| **z == 0.0).count();
    let mut kernel = Vec::with_capacity(lower.len() * upper.len());

    for (i, &zi) in upper.iter().enumerate() {
        for (j, &zj) in lower.iter().enumerate() {
            let h = if zi == 0.0 && zj == 0.0 {
                // Both at the median: row index among upper zeros, column among lower zeros
                let a = i as i64;
                let b = (j + ties) as i64 - lower.len() as i64;
                (a + b - (ties as i64 - 1)).signum() as f64
            } else {
                (zi + zj) / (zi - zj)
            };
            kernel.push(h);
        }
    }

    if kernel.is_empty() {
        return Err(MathError::CalculationError(
            "Medcouple kernel is empty".to_string(),
        ));
    }

    median(&kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_median_odd_and_even() {
        assert_abs_diff_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_abs_diff_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_median_rejects_empty_and_nan() {
        assert!(matches!(median(&[]), Err(MathError::InsufficientData(_))));
        assert!(matches!(
            median(&[1.0, f64::NAN]),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_median_absolute_deviation() {
        // median = 2, deviations = [1, 1, 0, 0, 2, 4, 7] -> median 1
        let values = [1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0];
        assert_abs_diff_eq!(median_absolute_deviation(&values).unwrap(), 1.0);
    }

    #[test]
    fn test_medcouple_symmetric_sample_is_zero() {
        let values = [-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0];
        assert_abs_diff_eq!(medcouple(&values).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_medcouple_sign_follows_skew() {
        let right_skewed = [0.0, 0.1, 0.2, 0.3, 0.5, 1.0, 3.0, 8.0];
        let left_skewed: Vec<f64> = right_skewed.iter().map(|v| -v).collect();

        let mc_right = medcouple(&right_skewed).unwrap();
        let mc_left = medcouple(&left_skewed).unwrap();

        assert!(mc_right > 0.0);
        assert_abs_diff_eq!(mc_left, -mc_right, epsilon = 1e-12);
        assert!(mc_right <= 1.0);
    }

    #[test]
    fn test_medcouple_constant_sample() {
        assert_abs_diff_eq!(medcouple(&[5.0; 6]).unwrap(), 0.0);
    }

    #[test]
    fn test_mean_and_max() {
        assert_abs_diff_eq!(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0);
        assert_abs_diff_eq!(max(&[1.0, 7.0, 6.0]).unwrap(), 7.0);
    }
}
