use price_forecast::config::{validate_split_coefficient, EngineConfig};
use price_forecast::error::ForecastError;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_defaults_are_valid() {
    let config = EngineConfig::default();
    config.validate().unwrap();

    assert_eq!(config.split_coefficient, 0.15);
    assert_eq!(config.horizon, 28);
    assert_eq!(config.max_change, 0.05);
    assert_eq!(config.seasonal_period, 12);
    assert!(config.workers > 0);
}

#[rstest]
#[case(EngineConfig { horizon: 0, ..Default::default() })]
#[case(EngineConfig { split_coefficient: 1.0, ..Default::default() })]
#[case(EngineConfig { max_change: 0.0, ..Default::default() })]
#[case(EngineConfig { seasonal_period: 1, ..Default::default() })]
#[case(EngineConfig { workers: 0, ..Default::default() })]
#[case(EngineConfig { fit_timeout_secs: 0, ..Default::default() })]
fn test_validate_rejects(#[case] config: EngineConfig) {
    assert!(matches!(
        config.validate(),
        Err(ForecastError::InvalidArgument(_))
    ));
}

#[rstest]
#[case(0.002, true)]
#[case(0.15, true)]
#[case(0.998, true)]
#[case(0.001, false)]
#[case(0.9995, false)]
fn test_split_coefficient_bounds(#[case] coefficient: f64, #[case] valid: bool) {
    assert_eq!(validate_split_coefficient(coefficient).is_ok(), valid);
}

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(
        &path,
        "models_dir = \"/tmp/price-models\"\nhorizon = 12\nworkers = 3\n",
    )
    .unwrap();

    let config = EngineConfig::load(Some(&path)).unwrap();
    assert_eq!(config.models_dir, PathBuf::from("/tmp/price-models"));
    assert_eq!(config.horizon, 12);
    assert_eq!(config.workers, 3);
    assert_eq!(config.split_coefficient, 0.15);
}

#[test]
fn test_load_rejects_invalid_file_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(&path, "split_coefficient = 1.5\n").unwrap();

    assert!(matches!(
        EngineConfig::load(Some(&path)),
        Err(ForecastError::InvalidArgument(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let result = EngineConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));
}
