//! # BTC Forecast
//!
//! Daily next-day close forecasting and backtesting pipeline for crypto
//! assets.
//!
//! Each run restricts history to a cutoff date, derives point-in-time
//! features, trains a fresh linear baseline, forecasts the next day's close
//! and appends it to an idempotent prediction history; a later run fills in
//! realized outcomes. A backtest replays past days one at a time without
//! ever seeing data from after the simulated day.
//!
//! ## Modules
//!
//! - `api` - Bybit client for fetching daily market data
//! - `data` - bar types and price series persistence
//! - `features` - point-in-time feature and label construction
//! - `model` - linear baseline regression and the forecasting wrapper
//! - `store` - append-only prediction history
//! - `pipeline` - run loop, evaluation pass, backtest driver
//! - `metrics` - accuracy summary over reconciled forecasts
//!
//! ## Example
//!
//! ```rust,no_run
//! use btc_forecast::api::BybitClient;
//! use btc_forecast::pipeline::{Cutoff, PipelineRunner};
//! use btc_forecast::store::InMemoryPredictionStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BybitClient::new();
//!     let bars = client.get_daily_bars("BTCUSDT", 365).await?;
//!
//!     let mut store = InMemoryPredictionStore::new();
//!     let runner = PipelineRunner::new("linear_baseline");
//!     let outcome = runner.run_once(&mut store, &bars, Cutoff::Live)?;
//!
//!     println!(
//!         "{} forecast for {}: {:.2}",
//!         runner.model_name(),
//!         outcome.target_date,
//!         outcome.predicted_close
//!     );
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod data;
pub mod features;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod store;

pub use api::BybitClient;
pub use data::DailyBar;
pub use features::{FeatureBuilder, FeatureRow};
pub use metrics::ForecastAccuracy;
pub use model::{ForecastError, Forecaster, LinearRegression, LINEAR_BASELINE};
pub use pipeline::{BacktestDriver, Cutoff, Evaluator, PipelineError, PipelineRunner};
pub use store::{AppendOutcome, CsvPredictionStore, Forecast, InMemoryPredictionStore, PredictionStore};
