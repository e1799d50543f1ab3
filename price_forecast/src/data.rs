//! Long-format price data and per-product series

use crate::error::{ForecastError, Result};
use crate::slug::slugify;
use chrono::{DateTime, Duration, NaiveDate};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Column holding the product label
pub const PRODUCT_COLUMN: &str = "Product";
/// Column holding the observation date
pub const DATE_COLUMN: &str = "Date";
/// Column holding the price index value
pub const PRICE_COLUMN: &str = "Price";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One price observation of one product
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub product: String,
    pub date: NaiveDate,
    pub price: f64,
}

impl Observation {
    pub fn new(product: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            product: product.into(),
            date,
            price,
        }
    }
}

/// Date-sorted observations of a single product.
///
/// Always non-empty, with unique dates and finite prices.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    product: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series from unordered `(date, price)` points
    pub fn new(product: impl Into<String>, mut points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let product = product.into();
        if points.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
        if let Some((date, price)) = points.iter().find(|(_, p)| !p.is_finite()) {
            return Err(ForecastError::InvalidArgument(format!(
                "Non-finite price {} for '{}' on {}",
                price, product, date
            )));
        }

        points.sort_by_key(|(date, _)| *date);
        if let Some(pair) = points.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ForecastError::InvalidArgument(format!(
                "Duplicate observation for '{}' on {}",
                product, pair[0].0
            )));
        }

        let (dates, values) = points.into_iter().unzip();
        Ok(Self {
            product,
            dates,
            values,
        })
    }

    /// Build a series from observations that all belong to one product
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self> {
        let product = observations
            .first()
            .map(|o| o.product.clone())
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;
        if let Some(other) = observations.iter().find(|o| o.product != product) {
            return Err(ForecastError::InvalidArgument(format!(
                "Series mixes products '{}' and '{}'",
                product, other.product
            )));
        }
        Self::new(
            product,
            observations.into_iter().map(|o| (o.date, o.price)).collect(),
        )
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Earliest `(date, price)`
    pub fn first(&self) -> (NaiveDate, f64) {
        (self.dates[0], self.values[0])
    }

    /// Latest `(date, price)`
    pub fn last(&self) -> (NaiveDate, f64) {
        let i = self.values.len() - 1;
        (self.dates[i], self.values[i])
    }

    /// Whole days between the first and last observation
    pub fn day_span(&self) -> i64 {
        (self.last().0 - self.first().0).num_days()
    }

    /// Observations as owned records
    pub fn observations(&self) -> Vec<Observation> {
        self.dates
            .iter()
            .zip(self.values.iter())
            .map(|(d, v)| Observation::new(self.product.clone(), *d, *v))
            .collect()
    }

    /// Split into `(date <= boundary, date > boundary)` point lists
    pub(crate) fn partition_at(&self, boundary: NaiveDate) -> (Vec<(NaiveDate, f64)>, Vec<(NaiveDate, f64)>) {
        self.dates
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .partition(|(date, _)| *date <= boundary)
    }
}

/// The full long-format dataset, one row per `(Product, Date, Price)`
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    /// Load the cleaned long-format CSV. Extra columns (such as a leading
    /// unnamed index) are ignored.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        debug!(path = %path.as_ref().display(), rows = df.height(), "Loaded dataset");
        Self::from_dataframe(df)
    }

    /// Wrap an existing DataFrame that has the long-format columns
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        for required in [PRODUCT_COLUMN, DATE_COLUMN, PRICE_COLUMN] {
            if df.column(required).is_err() {
                return Err(ForecastError::DataError(format!(
                    "Dataset is missing the '{}' column",
                    required
                )));
            }
        }
        Ok(Self { df })
    }

    /// Build a dataset from in-memory observations
    pub fn from_observations(observations: &[Observation]) -> Result<Self> {
        let products: Vec<&str> = observations.iter().map(|o| o.product.as_str()).collect();
        let dates: Vec<String> = observations
            .iter()
            .map(|o| o.date.format(DATE_FORMAT).to_string())
            .collect();
        let prices: Vec<f64> = observations.iter().map(|o| o.price).collect();

        let df = DataFrame::new(vec![
            polars::prelude::Series::new(PRODUCT_COLUMN, products),
            polars::prelude::Series::new(DATE_COLUMN, dates),
            polars::prelude::Series::new(PRICE_COLUMN, prices),
        ])?;
        Self::from_dataframe(df)
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Every row as an observation; rows with a null cell are skipped
    pub fn observations(&self) -> Result<Vec<Observation>> {
        let products = self.df.column(PRODUCT_COLUMN)?.cast(&DataType::Utf8)?;
        let products = products.utf8()?;
        let dates = self.date_column()?;
        let prices = self.df.column(PRICE_COLUMN)?.cast(&DataType::Float64)?;
        let prices = prices.f64()?;

        let mut skipped = 0usize;
        let mut rows = Vec::with_capacity(self.df.height());
        for ((product, date), price) in products.into_iter().zip(dates).zip(prices.into_iter()) {
            match (product, date, price) {
                (Some(product), Some(date), Some(price)) => {
                    rows.push(Observation::new(product, date, price))
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "Skipped rows with missing cells");
        }
        Ok(rows)
    }

    /// Distinct product labels, sorted
    pub fn products(&self) -> Result<BTreeSet<String>> {
        let products = self.df.column(PRODUCT_COLUMN)?.cast(&DataType::Utf8)?;
        Ok(products
            .utf8()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    /// `(label, slug)` pairs for every distinct product, sorted by label
    pub fn product_slugs(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .products()?
            .into_iter()
            .map(|label| {
                let slug = slugify(&label);
                (label, slug)
            })
            .collect())
    }

    /// Raw `(date, price)` points per product, in row order
    pub fn points_by_product(&self) -> Result<BTreeMap<String, Vec<(NaiveDate, f64)>>> {
        let mut grouped: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for obs in self.observations()? {
            grouped.entry(obs.product).or_default().push((obs.date, obs.price));
        }
        Ok(grouped)
    }

    /// Group rows into one series per product
    pub fn series_by_product(&self) -> Result<BTreeMap<String, Series>> {
        self.points_by_product()?
            .into_iter()
            .map(|(product, points)| {
                let series = Series::new(product.clone(), points)?;
                Ok((product, series))
            })
            .collect()
    }

    fn date_column(&self) -> Result<Vec<Option<NaiveDate>>> {
        let col = self.df.column(DATE_COLUMN)?;
        match col.dtype() {
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|cell| cell.map(parse_date).transpose())
                .collect(),
            DataType::Date => {
                let epoch = unix_epoch()?;
                let days = col.cast(&DataType::Int32)?;
                Ok(days
                    .i32()?
                    .into_iter()
                    .map(|days| days.map(|d| epoch + Duration::days(d as i64)))
                    .collect())
            }
            DataType::Datetime(_, _) => {
                let as_ms = col
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                    .cast(&DataType::Int64)?;
                Ok(as_ms
                    .i64()?
                    .into_iter()
                    .map(|ms| {
                        ms.and_then(DateTime::from_timestamp_millis)
                            .map(|dt| dt.date_naive())
                    })
                    .collect())
            }
            other => Err(ForecastError::DataError(format!(
                "Column '{}' has unsupported type {}",
                DATE_COLUMN, other
            ))),
        }
    }
}

fn unix_epoch() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| ForecastError::DataError("Invalid epoch date".to_string()))
}

/// Parse `YYYY-MM-DD`, tolerating a trailing time part
fn parse_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    Ok(NaiveDate::parse_from_str(date_part, DATE_FORMAT)?)
}

/// Read-only access to per-product series of a dataset
#[derive(Debug, Clone)]
pub struct SeriesRepository {
    dataset: Dataset,
}

impl SeriesRepository {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Open the long-format CSV at `path`
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Dataset::from_csv(path)?))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Resolve a slug back to its original product label
    pub fn resolve(&self, slug: &str) -> Result<String> {
        self.dataset
            .products()?
            .into_iter()
            .find(|label| slugify(label) == slug)
            .ok_or_else(|| ForecastError::NotFound(format!("No product found matching '{}'", slug)))
    }

    /// Load the date-sorted series of the product whose slug is `slug`.
    ///
    /// When several labels share a slug the first one in sorted order wins,
    /// the same label [`resolve`](Self::resolve) returns.
    pub fn load(&self, slug: &str) -> Result<Series> {
        let observations = self.dataset.observations()?;
        let labels: BTreeSet<&str> = observations.iter().map(|o| o.product.as_str()).collect();
        let label = labels
            .into_iter()
            .find(|label| slugify(label) == slug)
            .map(str::to_string)
            .ok_or_else(|| ForecastError::NotFound(format!("No product found matching '{}'", slug)))?;

        let points = observations
            .into_iter()
            .filter(|o| o.product == label)
            .map(|o| (o.date, o.price))
            .collect();
        Series::new(label, points)
    }

    /// Load the date-sorted series of the product labelled `label`
    pub fn load_by_label(&self, label: &str) -> Result<Series> {
        let points: Vec<(NaiveDate, f64)> = self
            .dataset
            .observations()?
            .into_iter()
            .filter(|o| o.product == label)
            .map(|o| (o.date, o.price))
            .collect();
        if points.is_empty() {
            return Err(ForecastError::NotFound(format!(
                "No observations for product '{}'",
                label
            )));
        }
        Series::new(label, points)
    }
}
