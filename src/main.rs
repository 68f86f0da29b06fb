//! BTC Forecast - daily next-day close forecasting pipeline
//!
//! Fetches daily bars, keeps an append-only forecast history, reconciles
//! past forecasts against realized closes, and replays history in backtest
//! mode.

use anyhow::{Context, Result};
use btc_forecast::api::BybitClient;
use btc_forecast::data::{load_bars, merge_bars, save_bars, DailyBar};
use btc_forecast::metrics::ForecastAccuracy;
use btc_forecast::model::LINEAR_BASELINE;
use btc_forecast::pipeline::{BacktestDriver, Cutoff, Evaluator, PipelineRunner};
use btc_forecast::store::{AppendOutcome, CsvPredictionStore, PredictionStore};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "btc_forecast")]
#[command(about = "Daily next-day close forecasting and backtesting pipeline")]
struct Cli {
    /// Price series CSV path
    #[arg(long, default_value = "data/btc_prices.csv", global = true)]
    data: PathBuf,

    /// Prediction history CSV path
    #[arg(long, default_value = "data/predictions.csv", global = true)]
    predictions: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch daily bars and merge them into the stored price series
    Fetch {
        /// Trading symbol (e.g., BTCUSDT)
        #[arg(short, long, default_value = "BTCUSDT")]
        symbol: String,

        /// Number of days to fetch (max 1000)
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,

        /// Use testnet instead of mainnet
        #[arg(long, default_value_t = false)]
        testnet: bool,
    },

    /// Evaluate past forecasts and predict tomorrow's close
    Live {
        /// Trading symbol (e.g., BTCUSDT)
        #[arg(short, long, default_value = "BTCUSDT")]
        symbol: String,

        /// Model name recorded with the forecast
        #[arg(short, long, default_value = LINEAR_BASELINE)]
        model: String,

        /// Skip the data refresh and run on the stored series only
        #[arg(long, default_value_t = false)]
        offline: bool,
    },

    /// Replay the pipeline day by day over a past date range
    Backtest {
        /// Trading symbol (e.g., BTCUSDT)
        #[arg(short, long, default_value = "BTCUSDT")]
        symbol: String,

        /// First simulated day (YYYY-MM-DD)
        #[arg(long)]
        start_date: NaiveDate,

        /// Last simulated day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// Model name recorded with the forecasts
        #[arg(short, long, default_value = LINEAR_BASELINE)]
        model: String,

        /// Skip the data refresh and run on the stored series only
        #[arg(long, default_value_t = false)]
        offline: bool,
    },

    /// Reconcile stored forecasts against realized closes
    Evaluate,
}

/// Fetch fresh bars and merge them into the stored series
async fn refresh_series(
    path: &Path,
    symbol: &str,
    limit: usize,
    testnet: bool,
) -> Result<Vec<DailyBar>> {
    let client = if testnet {
        BybitClient::testnet()
    } else {
        BybitClient::new()
    };

    info!(symbol, limit, "fetching daily bars");
    let fresh = client.get_daily_bars(symbol, limit).await?;
    info!(fetched = fresh.len(), "fetch complete");

    let merged = match load_bars(path) {
        Ok(existing) => merge_bars(&existing, &fresh),
        Err(_) => fresh,
    };
    save_bars(&merged, path)?;

    Ok(merged)
}

/// Load the stored series, pointing at the fetch step when it is absent
fn load_series(path: &Path) -> Result<Vec<DailyBar>> {
    load_bars(path).with_context(|| {
        format!(
            "no usable price series at {:?}; run `btc_forecast fetch` first",
            path
        )
    })
}

fn print_accuracy(store: &CsvPredictionStore) {
    match ForecastAccuracy::from_records(store.records()) {
        Some(accuracy) => println!("History:  {}", accuracy.summary()),
        None => println!("History:  no evaluated forecasts yet"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            symbol,
            limit,
            testnet,
        } => {
            let bars = refresh_series(&cli.data, &symbol, limit, testnet).await?;

            if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
                println!("\n{} Price Series", symbol);
                println!("=================");
                println!("Rows:       {}", bars.len());
                println!("From:       {}", first.date);
                println!("To:         {}", last.date);
                println!("Last close: {:.2}", last.close);
                println!("Saved to:   {:?}", cli.data);
            }
        }

        Commands::Live {
            symbol,
            model,
            offline,
        } => {
            let bars = if offline {
                load_series(&cli.data)?
            } else {
                refresh_series(&cli.data, &symbol, 1000, false).await?
            };

            let mut store = CsvPredictionStore::load(&cli.predictions)?;

            let evaluated = Evaluator::reconcile(&mut store, &bars)?;
            if evaluated > 0 {
                println!("Filled outcomes for {} past forecast(s)", evaluated);
            }

            let runner = PipelineRunner::new(model.as_str());
            let outcome = runner.run_once(&mut store, &bars, Cutoff::Live)?;

            println!("\nNext-Day Forecast");
            println!("=================");
            println!("Model:     {}", model);
            println!("Cutoff:    {}", outcome.cutoff);
            println!("Target:    {}", outcome.target_date);
            println!("Predicted: {:.2}", outcome.predicted_close);
            if outcome.append == AppendOutcome::SkippedDuplicate {
                println!("(already recorded for this target date, not re-stored)");
            }
            print_accuracy(&store);
        }

        Commands::Backtest {
            symbol,
            start_date,
            end_date,
            model,
            offline,
        } => {
            // single snapshot taken before the loop; the driver never
            // re-fetches mid-replay
            let bars = if offline {
                load_series(&cli.data)?
            } else {
                refresh_series(&cli.data, &symbol, 1000, false).await?
            };

            let end = end_date.unwrap_or_else(|| Utc::now().date_naive());
            println!("Backtesting {} from {} to {}...", model, start_date, end);

            let mut store = CsvPredictionStore::load(&cli.predictions)?;
            let report =
                BacktestDriver::new(model.as_str()).run(&mut store, &bars, start_date, end)?;

            println!("\nBacktest Report");
            println!("===============");
            println!("Days simulated:     {}", report.days);
            println!("Forecasts stored:   {}", report.appended);
            println!("Already recorded:   {}", report.skipped_existing);
            println!("Insufficient days:  {}", report.skipped_insufficient);
            println!("Outcomes filled:    {}", report.outcomes_filled);
            print_accuracy(&store);
        }

        Commands::Evaluate => {
            let bars = load_series(&cli.data)?;
            let mut store = CsvPredictionStore::load(&cli.predictions)?;

            let evaluated = Evaluator::reconcile(&mut store, &bars)?;

            println!("\nEvaluation");
            println!("==========");
            println!("Outcomes filled: {}", evaluated);
            print_accuracy(&store);
        }
    }

    Ok(())
}
