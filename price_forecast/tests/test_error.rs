use forecast_math::MathError;
use price_forecast::error::ForecastError;
use rstest::rstest;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(
        ForecastError::from(io_error),
        ForecastError::IoError(_)
    ));

    let parse_error = chrono::NaiveDate::parse_from_str("not a date", "%Y-%m-%d").unwrap_err();
    assert!(matches!(
        ForecastError::from(parse_error),
        ForecastError::ParseError(_)
    ));

    let json_error = serde_json::from_str::<f64>("{").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::SerializationError(_)
    ));
}

#[rstest]
#[case(MathError::InsufficientData("empty".into()), "data_error")]
#[case(MathError::InvalidInput("nan".into()), "invalid_argument")]
#[case(MathError::NotConverged { iterations: 10 }, "model_fit_failed")]
#[case(MathError::CalculationError("overflow".into()), "model_fit_failed")]
#[case(MathError::DeadlineExceeded { iterations: 3 }, "timeout")]
fn test_math_error_mapping(#[case] err: MathError, #[case] kind: &str) {
    assert_eq!(ForecastError::from(err).kind(), kind);
}

#[test]
fn test_error_display() {
    let error = ForecastError::InsufficientData { needed: 24, got: 10 };
    assert_eq!(
        error.to_string(),
        "Insufficient data: need at least 24 observations, got 10"
    );

    let error = ForecastError::NotFound("No trained model for 'bread'".to_string());
    assert!(error.to_string().contains("bread"));
    assert_eq!(error.kind(), "not_found");

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error = ForecastError::from(io_error);
    assert!(error.to_string().contains("IO error"));
    assert!(error.to_string().contains("permission denied"));
}
