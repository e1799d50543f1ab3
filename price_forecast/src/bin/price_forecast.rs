//! # price-forecast
//!
//! Command-line entry point for training and serving price index models.

use clap::{Parser, Subcommand};
use price_forecast::config::EngineConfig;
use price_forecast::data::{Dataset, SeriesRepository};
use price_forecast::engine::{ForecastEngine, TrainingWindow};
use price_forecast::error::{ForecastError, Result};
use price_forecast::telemetry::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "price-forecast")]
#[command(about = "Weekly price index forecasting", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and store one model per product
    Train {
        /// Long-format CSV (defaults to the configured data file)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Share of the calendar span held out for testing
        #[arg(short, long)]
        split: Option<f64>,

        /// Fit on the whole history without a test window
        #[arg(long)]
        full_history: bool,
    },

    /// Print a forecast for one product as JSON
    Serve {
        /// Product slug
        slug: String,

        /// Number of weeks to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// Long-format CSV holding the product history
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// List products that have a trained model
    List,

    /// Print metadata of one stored model as JSON
    Metadata {
        /// Product slug
        slug: String,
    },

    /// List product labels and slugs in a dataset
    Products {
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Delete every trained model
    Erase {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_level, config.log_json);

    match cli.command {
        Commands::Train {
            data,
            split,
            full_history,
        } => {
            let path = data.unwrap_or_else(|| config.data_file.clone());
            let dataset = Dataset::from_csv(&path)?;
            let window = if full_history {
                TrainingWindow::FullHistory
            } else {
                TrainingWindow::HoldOut {
                    coefficient: split.unwrap_or(config.split_coefficient),
                }
            };

            let engine = ForecastEngine::from_config(config)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let report = runtime.block_on(async {
                match window {
                    TrainingWindow::HoldOut { coefficient } => {
                        engine.train_all(&dataset, coefficient).await
                    }
                    TrainingWindow::FullHistory => engine.train_all_with(&dataset, window).await,
                }
            })?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve {
            slug,
            horizon,
            data,
        } => {
            let path = data.unwrap_or_else(|| config.data_file.clone());
            let horizon = horizon.unwrap_or(config.horizon);
            let engine = ForecastEngine::from_config(config)?
                .with_repository(SeriesRepository::from_csv(&path)?);
            let served = engine.serve(&slug, horizon)?;
            println!("{}", serde_json::to_string_pretty(&served)?);
        }
        Commands::List => {
            let engine = ForecastEngine::from_config(config)?;
            for slug in engine.available_products()? {
                println!("{}", slug);
            }
        }
        Commands::Metadata { slug } => {
            let engine = ForecastEngine::from_config(config)?;
            println!("{}", serde_json::to_string_pretty(&engine.metadata(&slug)?)?);
        }
        Commands::Products { data } => {
            let path = data.unwrap_or_else(|| config.data_file.clone());
            for (label, slug) in Dataset::from_csv(&path)?.product_slugs()? {
                println!("{}\t{}", slug, label);
            }
        }
        Commands::Erase { yes } => {
            if !yes {
                return Err(ForecastError::InvalidArgument(
                    "Refusing to erase models without --yes".to_string(),
                ));
            }
            let erased = ForecastEngine::from_config(config)?.erase_all()?;
            println!("Erased {} model(s)", erased);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(kind = err.kind(), "{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
