//! Training and serving use cases
//!
//! Training path: split → fit → evaluate → interval summaries → store.
//! Serving path: store → forecast → constrain → band and weekly dates.

use crate::config::{validate_split_coefficient, EngineConfig};
use crate::constrain::constrain;
use crate::data::{Dataset, Series, SeriesRepository};
use crate::error::{ForecastError, Result};
use crate::intervals::{forecast_band, forecast_interval, in_sample_interval};
use crate::models::{evaluate, rmse, FittedModel, ForecastResult, Forecaster, HoltWinters};
use crate::slug::slugify;
use crate::split::split;
use crate::store::{BundleMetadata, ModelBundle, ModelStore};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Which part of a series a model is fitted on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainingWindow {
    /// Fit on the development window and score on the held-out tail
    HoldOut { coefficient: f64 },
    /// Fit on every observation; no out-of-sample score
    FullHistory,
}

/// Scores of a successfully trained product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSummary {
    pub slug: String,
    pub train_mae: Option<f64>,
    pub test_mae: Option<f64>,
    pub avg_forecast_ci_width: f64,
    pub avg_in_sample_ci_width: f64,
}

impl From<&ModelBundle> for BundleSummary {
    fn from(bundle: &ModelBundle) -> Self {
        Self {
            slug: bundle.slug.clone(),
            train_mae: bundle.train_mae,
            test_mae: bundle.test_mae,
            avg_forecast_ci_width: bundle.avg_forecast_ci_width,
            avg_in_sample_ci_width: bundle.avg_in_sample_ci_width,
        }
    }
}

/// Why a product could not be trained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingFailure {
    pub kind: String,
    pub message: String,
}

impl From<ForecastError> for TrainingFailure {
    fn from(err: ForecastError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result of training one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductOutcome {
    pub product: String,
    pub slug: String,
    pub result: std::result::Result<BundleSummary, TrainingFailure>,
}

/// Per-product results of a batch training run, sorted by product label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingReport {
    pub outcomes: Vec<ProductOutcome>,
}

impl TrainingReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ProductOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProductOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}

/// A served forecast with the scores of the model behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServedForecast {
    pub product_name: String,
    pub forecast: ForecastResult,
    pub train_mae: Option<f64>,
    pub test_mae: Option<f64>,
    /// RMSE of the fitted values against the full history
    pub rmse: f64,
    pub created_at: DateTime<Utc>,
}

/// `horizon` dates spaced one week apart, the first 7 days after `last_date`
pub fn weekly_dates(last_date: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|week| last_date + Duration::weeks(week))
        .collect()
}

/// Orchestrates training runs and forecast serving over one model store
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: EngineConfig,
    store: Arc<ModelStore>,
    repository: Option<Arc<SeriesRepository>>,
    /// Upper bound on each fit, initialised from `config.fit_timeout_secs`
    fit_timeout: StdDuration,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig, store: ModelStore) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fit_timeout: StdDuration::from_secs(config.fit_timeout_secs),
            config,
            store: Arc::new(store),
            repository: None,
        })
    }

    /// Open the store at `config.models_dir`
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let store = ModelStore::open(&config.models_dir)?;
        Self::new(config, store)
    }

    /// Source of the history used when serving
    pub fn with_repository(mut self, repository: SeriesRepository) -> Self {
        self.repository = Some(Arc::new(repository));
        self
    }

    /// Override the per-fit deadline with a finer bound than whole seconds
    pub fn with_fit_timeout(mut self, timeout: StdDuration) -> Self {
        self.fit_timeout = timeout;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    fn model(&self) -> Result<HoltWinters> {
        Ok(HoltWinters::new(self.config.seasonal_period)?.with_timeout(self.fit_timeout))
    }

    /// Fit, score and persist the model of a single product
    pub fn train_product(&self, series: &Series, window: TrainingWindow) -> Result<ModelBundle> {
        let model = self.model()?;
        info!(product = series.product(), observations = series.len(), "Training model");

        let (fitted, evaluation) = match window {
            TrainingWindow::HoldOut { coefficient } => {
                let parts = split(series, coefficient)?;
                let fitted = model.fit(&parts.dev)?;
                let evaluation = evaluate(&fitted, &parts.dev, Some(&parts.test))?;
                (fitted, evaluation)
            }
            TrainingWindow::FullHistory => {
                let fitted = model.fit(series)?;
                let evaluation = evaluate(&fitted, series, None)?;
                (fitted, evaluation)
            }
        };

        let forecast_ci = forecast_interval(&fitted, self.config.horizon)?.summarize()?;
        let in_sample_ci = in_sample_interval(&fitted)?.summarize()?;
        info!(
            product = series.product(),
            model = %fitted.name(),
            train_mae = ?evaluation.train_mae,
            test_mae = ?evaluation.test_mae,
            "Model trained"
        );

        let bundle = ModelBundle::new(
            series.product(),
            fitted,
            evaluation,
            forecast_ci,
            in_sample_ci,
        );
        self.store.save(&bundle)?;
        Ok(bundle)
    }

    /// Train every product of `dataset` on a hold-out split.
    ///
    /// Products are fitted on blocking worker tasks, at most
    /// `config.workers` at a time. A failing product is recorded in the
    /// report and does not stop the others. Only an invalid coefficient or
    /// an unreadable dataset fails the whole run.
    pub async fn train_all(&self, dataset: &Dataset, coefficient: f64) -> Result<TrainingReport> {
        validate_split_coefficient(coefficient)?;
        self.train_all_with(dataset, TrainingWindow::HoldOut { coefficient })
            .await
    }

    /// Like [`train_all`](Self::train_all) with an explicit training window
    pub async fn train_all_with(
        &self,
        dataset: &Dataset,
        window: TrainingWindow,
    ) -> Result<TrainingReport> {
        let grouped = dataset.points_by_product()?;
        info!(products = grouped.len(), workers = self.config.workers, "Starting training run");

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();
        let mut pending = Vec::with_capacity(grouped.len());

        for (product, points) in grouped {
            let slug = slugify(&product);

            // Labels come sorted, so the first label of a slug keeps it
            if let Some(owner) = claimed.get(&slug) {
                let err = ForecastError::InvalidState(format!(
                    "Product '{}' has the same slug '{}' as '{}'",
                    product, slug, owner
                ));
                pending.push((product, slug, Err(TrainingFailure::from(err))));
                continue;
            }
            claimed.insert(slug.clone(), product.clone());

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ForecastError::InvalidState(e.to_string()))?;
            let engine = self.clone();
            let label = product.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let series = Series::new(label, points)?;
                engine.train_product(&series, window)
            });
            pending.push((product, slug, Ok(handle)));
        }

        let mut report = TrainingReport::default();
        for (product, slug, task) in pending {
            let result = match task {
                Err(failure) => {
                    warn!(product = %product, slug = %slug, "Skipped product with a duplicate slug");
                    Err(failure)
                }
                Ok(handle) => match handle.await {
                    Ok(Ok(bundle)) => Ok(BundleSummary::from(&bundle)),
                    Ok(Err(err)) => {
                        warn!(product = %product, kind = err.kind(), error = %err, "Training failed");
                        Err(TrainingFailure::from(err))
                    }
                    Err(join_err) => {
                        warn!(product = %product, error = %join_err, "Training task aborted");
                        Err(TrainingFailure {
                            kind: "task_failed".to_string(),
                            message: join_err.to_string(),
                        })
                    }
                },
            };
            report.outcomes.push(ProductOutcome {
                product,
                slug,
                result,
            });
        }

        info!(
            succeeded = report.success_count(),
            failed = report.failure_count(),
            "Training run finished"
        );
        Ok(report)
    }

    /// Forecast `horizon` weeks for the product stored under `slug`
    pub fn serve(&self, slug: &str, horizon: usize) -> Result<ServedForecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidArgument(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        let repository = self.repository.as_ref().ok_or_else(|| {
            ForecastError::InvalidState("No series repository configured for serving".to_string())
        })?;

        let bundle = self.store.load(slug)?;
        let history = repository.load(slug)?;
        let (last_date, last_value) = history.last();

        let raw = bundle.fitted_model.forecast(horizon)?;
        let values = constrain(last_value, &raw, self.config.max_change)?;
        let band = forecast_band(&values, bundle.fitted_model.residuals())?;
        let forecast = ForecastResult::new(
            weekly_dates(last_date, horizon),
            values,
            band.lower,
            band.upper,
        )?;
        let history_rmse = rmse(&bundle.fitted_model, &history)?;

        Ok(ServedForecast {
            product_name: bundle.product_name,
            forecast,
            train_mae: bundle.train_mae,
            test_mae: bundle.test_mae,
            rmse: history_rmse,
            created_at: bundle.created_at,
        })
    }

    /// Display metadata of the model stored under `slug`
    pub fn metadata(&self, slug: &str) -> Result<BundleMetadata> {
        self.store.metadata(slug)
    }

    /// Slugs that currently have a trained model
    pub fn available_products(&self) -> Result<BTreeSet<String>> {
        self.store.list()
    }

    /// Delete every trained model
    pub fn erase_all(&self) -> Result<usize> {
        self.store.erase_all()
    }
}
