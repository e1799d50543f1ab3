//! Point forecast error metrics
//!
//! All metrics compare the overlapping tail of the two series: when the
//! lengths differ, only the last `min(len_a, len_b)` values of each are used.

use crate::{MathError, Result};

fn overlapping_tail<'a>(actual: &'a [f64], predicted: &'a [f64]) -> Result<(&'a [f64], &'a [f64])> {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Error metrics need at least one overlapping value".to_string(),
        ));
    }
    Ok((&actual[actual.len() - n..], &predicted[predicted.len() - n..]))
}

/// Mean absolute error over the overlapping tail
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    let (actual, predicted) = overlapping_tail(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean squared error over the overlapping tail
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    let (actual, predicted) = overlapping_tail(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error over the overlapping tail
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        assert_abs_diff_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
        assert_abs_diff_eq!(mean_squared_error(&actual, &predicted).unwrap(), 6.0);
        assert_abs_diff_eq!(
            root_mean_squared_error(&actual, &predicted).unwrap(),
            6.0_f64.sqrt()
        );
    }

    #[test]
    fn test_uses_overlapping_tail() {
        // Only the last two actual values are paired with the predictions
        let actual = vec![1000.0, 10.0, 20.0];
        let predicted = vec![11.0, 22.0];

        assert_abs_diff_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 1.5);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let result = mean_absolute_error(&[], &[1.0, 2.0]);
        assert!(matches!(result, Err(MathError::InsufficientData(_))));
    }
}
