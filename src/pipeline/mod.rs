//! The prediction-and-evaluation run loop
//!
//! A run is stateless start to finish: restrict history to the cutoff, build
//! features, train a fresh model, forecast one day ahead, append
//! idempotently. The only state that crosses runs is the prediction store.

pub mod backtest;
pub mod evaluate;
pub mod runner;

pub use backtest::{BacktestDriver, BacktestReport};
pub use evaluate::Evaluator;
pub use runner::{Cutoff, PipelineRunner, RunOutcome};

use crate::model::ForecastError;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from a single pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input the step depends on is absent; fatal to the step, but
    /// already-persisted state is untouched
    #[error("missing input data: {0}")]
    MissingData(String),

    /// The cutoff restriction left no visible bars
    #[error("no price data at or before {0}")]
    NoVisibleHistory(NaiveDate),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("prediction store failure: {0}")]
    Store(#[source] anyhow::Error),
}

impl PipelineError {
    /// Whether a backtest loop may skip this day and continue
    ///
    /// Thin history early in a range resolves itself as the replay advances;
    /// store and input failures do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::NoVisibleHistory(_)
                | PipelineError::Forecast(
                    ForecastError::InsufficientData | ForecastError::InsufficientHistory { .. }
                )
        )
    }
}
