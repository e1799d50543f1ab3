//! Persistence of trained models, one bundle per product slug
//!
//! Each bundle lives in `<models_dir>/<slug>.json`. Writes go to a temporary
//! file in the same directory that is then renamed over the target, so a
//! reader sees either the previous bundle or the new one in full.

use crate::error::{ForecastError, Result};
use crate::intervals::IntervalSummary;
use crate::models::{Evaluation, FittedHoltWinters};
use crate::slug::slugify;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const BUNDLE_EXTENSION: &str = "json";

/// Everything persisted for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub slug: String,
    pub product_name: String,
    pub fitted_model: FittedHoltWinters,
    pub train_mae: Option<f64>,
    pub test_mae: Option<f64>,
    pub avg_forecast_ci_width: f64,
    pub max_forecast_ci_width: f64,
    pub avg_in_sample_ci_width: f64,
    pub max_in_sample_ci_width: f64,
    pub created_at: DateTime<Utc>,
}

impl ModelBundle {
    /// Assemble a bundle stamped with the current time
    pub fn new(
        product_name: impl Into<String>,
        fitted_model: FittedHoltWinters,
        evaluation: Evaluation,
        forecast_ci: IntervalSummary,
        in_sample_ci: IntervalSummary,
    ) -> Self {
        let product_name = product_name.into();
        Self {
            slug: slugify(&product_name),
            product_name,
            fitted_model,
            train_mae: evaluation.train_mae,
            test_mae: evaluation.test_mae,
            avg_forecast_ci_width: forecast_ci.avg_width,
            max_forecast_ci_width: forecast_ci.max_width,
            avg_in_sample_ci_width: in_sample_ci.avg_width,
            max_in_sample_ci_width: in_sample_ci.max_width,
            created_at: Utc::now(),
        }
    }

    /// The bundle without its model state
    pub fn metadata(&self) -> BundleMetadata {
        BundleMetadata {
            product_name: self.product_name.clone(),
            url: format!("/forecast/{}", self.slug),
            train_mae: self.train_mae,
            test_mae: self.test_mae,
            avg_forecast_ci_width: self.avg_forecast_ci_width,
            max_forecast_ci_width: self.max_forecast_ci_width,
            avg_in_sample_ci_width: self.avg_in_sample_ci_width,
            max_in_sample_ci_width: self.max_in_sample_ci_width,
            created_at: self.created_at,
        }
    }
}

/// Display metadata of a stored bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub product_name: String,
    pub url: String,
    pub train_mae: Option<f64>,
    pub test_mae: Option<f64>,
    pub avg_forecast_ci_width: f64,
    pub max_forecast_ci_width: f64,
    pub avg_in_sample_ci_width: f64,
    pub max_in_sample_ci_width: f64,
    pub created_at: DateTime<Utc>,
}

/// Directory-backed map from slug to [`ModelBundle`].
///
/// `save`, `load`, `exists` and `list` share the store lock; `erase_all` takes it
/// exclusively. Writers of the same slug are additionally serialised by a
/// per-slug mutex, while different slugs write concurrently.
#[derive(Debug)]
pub struct ModelStore {
    dir: PathBuf,
    lock: RwLock<()>,
    slug_locks: DashMap<String, Arc<Mutex<()>>>,
}

fn poisoned<T>(_: T) -> ForecastError {
    ForecastError::InvalidState("Model store lock poisoned".to_string())
}

fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ForecastError::InvalidArgument(format!(
            "'{}' is not a valid product slug",
            slug
        )));
    }
    Ok(())
}

impl ModelStore {
    /// Open (creating if needed) the models directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened model store");
        Ok(Self {
            dir,
            lock: RwLock::new(()),
            slug_locks: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn bundle_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug, BUNDLE_EXTENSION))
    }

    fn slug_lock(&self, slug: &str) -> Arc<Mutex<()>> {
        self.slug_locks
            .entry(slug.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Replace the stored bundle for `bundle.slug`
    pub fn save(&self, bundle: &ModelBundle) -> Result<()> {
        validate_slug(&bundle.slug)?;
        let _shared = self.lock.read().map_err(poisoned)?;
        let slug_lock = self.slug_lock(&bundle.slug);
        let _writer = slug_lock.lock().map_err(poisoned)?;

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, bundle)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        let path = self.bundle_path(&bundle.slug);
        tmp.persist(&path).map_err(|e| e.error)?;

        info!(slug = %bundle.slug, path = %path.display(), "Saved model bundle");
        Ok(())
    }

    /// Read the bundle stored for `slug`
    pub fn load(&self, slug: &str) -> Result<ModelBundle> {
        validate_slug(slug)?;
        let _shared = self.lock.read().map_err(poisoned)?;

        let path = self.bundle_path(slug);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::NotFound(format!(
                    "No trained model for '{}'",
                    slug
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let bundle: ModelBundle = serde_json::from_str(&text)?;
        if bundle.slug != slug {
            return Err(ForecastError::DataError(format!(
                "Bundle file for '{}' holds slug '{}'",
                slug, bundle.slug
            )));
        }
        Ok(bundle)
    }

    /// Metadata of the bundle stored for `slug`
    pub fn metadata(&self, slug: &str) -> Result<BundleMetadata> {
        Ok(self.load(slug)?.metadata())
    }

    /// A bundle is stored for `slug`. Invalid slugs and a poisoned lock
    /// count as absent.
    pub fn exists(&self, slug: &str) -> bool {
        if validate_slug(slug).is_err() {
            return false;
        }
        match self.lock.read() {
            Ok(_shared) => self.bundle_path(slug).is_file(),
            Err(_) => false,
        }
    }

    /// Slugs of every stored bundle
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let _shared = self.lock.read().map_err(poisoned)?;
        self.bundle_slugs()
    }

    /// No bundle is stored
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.list()?.is_empty())
    }

    /// Delete every stored bundle. Returns how many were removed.
    pub fn erase_all(&self) -> Result<usize> {
        let _exclusive = self.lock.write().map_err(poisoned)?;

        let slugs = self.bundle_slugs()?;
        for slug in &slugs {
            match fs::remove_file(self.bundle_path(slug)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(slug = %slug, "Bundle vanished during erase");
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.slug_locks.clear();

        info!(erased = slugs.len(), dir = %self.dir.display(), "Erased all model bundles");
        Ok(slugs.len())
    }

    fn bundle_slugs(&self) -> Result<BTreeSet<String>> {
        if !self.dir.is_dir() {
            return Ok(BTreeSet::new());
        }

        let mut slugs = BTreeSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_bundle = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(BUNDLE_EXTENSION);
            if !is_bundle {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                slugs.insert(stem.to_string());
            }
        }
        Ok(slugs)
    }
}
