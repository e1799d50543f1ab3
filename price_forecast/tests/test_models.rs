use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use price_forecast::data::Series;
use price_forecast::error::ForecastError;
use price_forecast::models::{evaluate, rmse, FittedHoltWinters, FittedModel, Forecaster, HoltWinters};
use price_forecast::split::split;
use std::f64::consts::PI;
use std::time::Duration as StdDuration;

fn series_from(values: Vec<f64>) -> Series {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let points = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::weeks(i as i64), v))
        .collect();
    Series::new("Bread", points).unwrap()
}

/// `[100, 102, 101, 103, 105, 104]` repeated
fn create_price_series(len: usize) -> Series {
    let pattern = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0];
    series_from((0..len).map(|i| pattern[i % pattern.len()]).collect())
}

/// Linear trend plus a 12-week sine season
fn create_seasonal_series(len: usize) -> Series {
    series_from(
        (0..len)
            .map(|t| {
                let t = t as f64;
                100.0 + 0.2 * t + 3.0 * (2.0 * PI * t / 12.0).sin()
            })
            .collect(),
    )
}

#[test]
fn test_holt_winters_forecast_horizon() {
    let series = create_price_series(42);
    let parts = split(&series, 0.15).unwrap();
    let fitted = HoltWinters::default().fit(&parts.dev).unwrap();

    let forecast = fitted.forecast(28).unwrap();
    assert_eq!(forecast.len(), 28);
    assert!(forecast.iter().all(|v| v.is_finite()));

    assert_eq!(fitted.fitted_values().len(), parts.dev.len());
    for ((y, f), r) in parts
        .dev
        .values()
        .iter()
        .zip(fitted.fitted_values())
        .zip(fitted.residuals())
    {
        assert_abs_diff_eq!(y - f, *r, epsilon = 1e-12);
    }
}

#[test]
fn test_holt_winters_parameters_within_bounds() {
    let fitted = HoltWinters::default()
        .fit(&create_seasonal_series(48))
        .unwrap();
    let (alpha, beta, gamma) = fitted.params();

    for p in [alpha, beta, gamma] {
        assert!(p > 0.0 && p < 1.0, "parameter {} out of (0, 1)", p);
    }
    assert_eq!(fitted.seasonal_period(), 12);
    assert!(fitted.sse() >= 0.0);
}

#[test]
fn test_holt_winters_tracks_trend_and_season() {
    let series = create_seasonal_series(48);
    let fitted = HoltWinters::default().fit(&series).unwrap();

    let forecast = fitted.forecast(12).unwrap();
    let forecast_mean = forecast.iter().sum::<f64>() / 12.0;
    // Trend line averaged over t = 48..59
    let expected_mean = 100.0 + 0.2 * 53.5;

    assert!(
        (forecast_mean - expected_mean).abs() < 4.0,
        "forecast mean {} too far from {}",
        forecast_mean,
        expected_mean
    );
}

#[test]
fn test_holt_winters_requires_two_seasons() {
    let result = HoltWinters::default().fit(&create_price_series(23));
    assert!(matches!(
        result,
        Err(ForecastError::InsufficientData {
            needed: 24,
            got: 23
        })
    ));

    assert!(HoltWinters::default().fit(&create_price_series(24)).is_ok());
}

#[test]
fn test_holt_winters_invalid_arguments() {
    assert!(matches!(
        HoltWinters::new(1),
        Err(ForecastError::InvalidArgument(_))
    ));

    let fitted = HoltWinters::default()
        .fit(&create_price_series(30))
        .unwrap();
    assert!(matches!(
        fitted.forecast(0),
        Err(ForecastError::InvalidArgument(_))
    ));
}

#[test]
fn test_holt_winters_iteration_budget_is_reported() {
    let model = HoltWinters::default().with_max_iter(1);
    let result = model.fit(&create_seasonal_series(48));
    assert!(matches!(result, Err(ForecastError::ModelFitFailed(_))));
}

#[test]
fn test_holt_winters_deadline_is_reported() {
    let model = HoltWinters::default().with_timeout(StdDuration::ZERO);
    let result = model.fit(&create_seasonal_series(48));
    assert!(matches!(result, Err(ForecastError::Timeout(_))));
}

#[test]
fn test_evaluate_scores_train_and_test() {
    let series = create_price_series(42);
    let parts = split(&series, 0.15).unwrap();
    let fitted = HoltWinters::default().fit(&parts.dev).unwrap();

    let evaluation = evaluate(&fitted, &parts.dev, Some(&parts.test)).unwrap();
    let train_mae = evaluation.train_mae.unwrap();
    let test_mae = evaluation.test_mae.unwrap();
    assert!(train_mae >= 0.0 && train_mae.is_finite());
    assert!(test_mae >= 0.0 && test_mae.is_finite());

    let in_sample_only = evaluate(&fitted, &parts.dev, None).unwrap();
    assert_eq!(in_sample_only.test_mae, None);
    assert_eq!(in_sample_only.train_mae, evaluation.train_mae);
}

#[test]
fn test_rmse_against_history() {
    let series = create_price_series(42);
    let fitted = HoltWinters::default().fit(&series).unwrap();

    let residual_rmse = (fitted.residuals().iter().map(|r| r * r).sum::<f64>()
        / fitted.residuals().len() as f64)
        .sqrt();
    assert_abs_diff_eq!(rmse(&fitted, &series).unwrap(), residual_rmse, epsilon = 1e-9);
}

#[test]
fn test_fitted_model_survives_serialization() {
    let fitted = HoltWinters::default()
        .fit(&create_seasonal_series(36))
        .unwrap();

    let json = serde_json::to_string(&fitted).unwrap();
    let restored: FittedHoltWinters = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, fitted);
    assert_eq!(restored.forecast(5).unwrap(), fitted.forecast(5).unwrap());
}
