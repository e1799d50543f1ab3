use chrono::{Duration, NaiveDate};
use price_forecast::config::EngineConfig;
use price_forecast::data::{Dataset, Observation, SeriesRepository};
use price_forecast::engine::{weekly_dates, ForecastEngine, TrainingWindow};
use price_forecast::error::ForecastError;
use price_forecast::store::ModelStore;
use std::time::Duration as StdDuration;
use tempfile::{tempdir, TempDir};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

fn weekly_observations(product: &str, values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new(product, start_date() + Duration::weeks(i as i64), *v))
        .collect()
}

/// Two trainable products and one too short to fit
fn create_dataset() -> Dataset {
    let pattern = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0];
    let bread: Vec<f64> = (0..42).map(|i| pattern[i % 6]).collect();
    let milk: Vec<f64> = (0..40).map(|i| 80.0 + 0.25 * i as f64 + (i % 4) as f64).collect();
    let short: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();

    let mut observations = weekly_observations("Хлеб ржаной, кг", &bread);
    observations.extend(weekly_observations("Молоко, л", &milk));
    observations.extend(weekly_observations("Short", &short));
    Dataset::from_observations(&observations).unwrap()
}

fn create_engine(dir: &TempDir, dataset: &Dataset) -> ForecastEngine {
    let config = EngineConfig {
        models_dir: dir.path().to_path_buf(),
        workers: 2,
        ..Default::default()
    };
    let store = ModelStore::open(dir.path()).unwrap();
    ForecastEngine::new(config, store)
        .unwrap()
        .with_repository(SeriesRepository::new(dataset.clone()))
}

#[tokio::test]
async fn test_train_all_isolates_failures() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);

    let report = engine.train_all(&dataset, 0.15).await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);

    let failed = report.failed().next().unwrap();
    assert_eq!(failed.product, "Short");
    assert_eq!(failed.slug, "short");
    assert_eq!(failed.result.as_ref().unwrap_err().kind, "insufficient_data");

    let available = engine.available_products().unwrap();
    assert!(available.contains("hleb-rzhanoi-kg"));
    assert!(available.contains("moloko-l"));
    assert!(!available.contains("short"));
}

#[tokio::test]
async fn test_train_all_rejects_bad_coefficient() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);

    let result = engine.train_all(&dataset, 1.0).await;
    assert!(matches!(result, Err(ForecastError::InvalidArgument(_))));
    assert!(engine.available_products().unwrap().is_empty());
}

#[tokio::test]
async fn test_full_history_has_no_test_score() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);

    engine
        .train_all_with(&dataset, TrainingWindow::FullHistory)
        .await
        .unwrap();

    let metadata = engine.metadata("moloko-l").unwrap();
    assert!(metadata.train_mae.is_some());
    assert_eq!(metadata.test_mae, None);
}

#[tokio::test]
async fn test_serve_bounded_weekly_forecast() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);
    engine.train_all(&dataset, 0.15).await.unwrap();

    let served = engine.serve("hleb-rzhanoi-kg", 28).unwrap();
    let forecast = &served.forecast;

    assert_eq!(served.product_name, "Хлеб ржаной, кг");
    assert_eq!(forecast.horizon(), 28);
    assert!(served.test_mae.is_some());
    assert!(served.rmse.is_finite());

    // History ends at 104 on week 41
    let last_date = start_date() + Duration::weeks(41);
    assert_eq!(forecast.dates()[0], last_date + Duration::days(7));
    assert_eq!(forecast.dates(), weekly_dates(last_date, 28).as_slice());

    let first = forecast.values()[0];
    assert!((104.0 * 0.95..=104.0 * 1.05).contains(&first));

    let mut previous = 104.0;
    for value in forecast.values() {
        assert!(((value - previous) / previous).abs() <= 0.05 + 1e-12);
        previous = *value;
    }

    for i in 0..28 {
        assert!(forecast.lower_ci()[i] <= forecast.values()[i]);
        assert!(forecast.values()[i] <= forecast.upper_ci()[i]);
    }
}

#[tokio::test]
async fn test_serve_errors() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);
    engine.train_all(&dataset, 0.15).await.unwrap();

    assert!(matches!(
        engine.serve("nonexistent-slug", 28),
        Err(ForecastError::NotFound(_))
    ));
    assert!(matches!(
        engine.serve("short", 28),
        Err(ForecastError::NotFound(_))
    ));
    assert!(matches!(
        engine.serve("moloko-l", 0),
        Err(ForecastError::InvalidArgument(_))
    ));

    let config = EngineConfig {
        models_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let without_history = ForecastEngine::from_config(config).unwrap();
    assert!(matches!(
        without_history.serve("moloko-l", 28),
        Err(ForecastError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_erase_all_then_retrain() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);

    engine.train_all(&dataset, 0.15).await.unwrap();
    assert_eq!(engine.erase_all().unwrap(), 2);
    assert!(engine.available_products().unwrap().is_empty());

    engine.train_all(&dataset, 0.15).await.unwrap();
    assert_eq!(engine.available_products().unwrap().len(), 2);
}

#[tokio::test]
async fn test_train_all_reports_timeouts_per_product() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset).with_fit_timeout(StdDuration::ZERO);

    let report = engine.train_all(&dataset, 0.15).await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.success_count(), 0);
    let kinds: Vec<(&str, &str)> = report
        .outcomes
        .iter()
        .map(|o| (o.slug.as_str(), o.result.as_ref().unwrap_err().kind.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("short", "insufficient_data"),
            ("moloko-l", "timeout"),
            ("hleb-rzhanoi-kg", "timeout"),
        ]
    );
    assert!(engine.available_products().unwrap().is_empty());

    // Same store, default deadline
    let retry = create_engine(&dir, &dataset);
    let report = retry.train_all(&dataset, 0.15).await.unwrap();
    assert_eq!(report.success_count(), 2);
    assert!(retry.store().exists("moloko-l"));
}

#[tokio::test]
async fn test_train_all_rejects_duplicate_slugs() {
    let dir = tempdir().unwrap();
    let pattern = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0];
    let upper: Vec<f64> = (0..42).map(|i| pattern[i % 6]).collect();
    let lower: Vec<f64> = (0..42).map(|i| pattern[i % 6] / 2.0).collect();
    let mut observations = weekly_observations("Milk", &upper);
    observations.extend(weekly_observations("milk", &lower));
    let dataset = Dataset::from_observations(&observations).unwrap();
    let engine = create_engine(&dir, &dataset);

    let report = engine.train_all(&dataset, 0.15).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].product, "Milk");
    assert!(report.outcomes[0].result.is_ok());

    let duplicate = &report.outcomes[1];
    assert_eq!(duplicate.product, "milk");
    assert_eq!(duplicate.slug, "milk");
    assert_eq!(duplicate.result.as_ref().unwrap_err().kind, "invalid_state");

    let bundle = engine.store().load("milk").unwrap();
    assert_eq!(bundle.product_name, "Milk");
}

#[test]
fn test_train_product_directly() {
    let dir = tempdir().unwrap();
    let dataset = create_dataset();
    let engine = create_engine(&dir, &dataset);
    let series = SeriesRepository::new(dataset).load("moloko-l").unwrap();

    let bundle = engine
        .train_product(&series, TrainingWindow::HoldOut { coefficient: 0.15 })
        .unwrap();

    assert_eq!(bundle.slug, "moloko-l");
    assert!(bundle.avg_forecast_ci_width > 0.0);
    assert!(bundle.max_forecast_ci_width >= bundle.avg_forecast_ci_width);
    assert!(bundle.max_in_sample_ci_width >= bundle.avg_in_sample_ci_width);
    assert!(engine.store().exists("moloko-l"));
}
