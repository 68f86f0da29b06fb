//! Day-by-day replay of the pipeline over a date range
//!
//! Each simulated day trains on exactly the prefix of history visible on
//! that day, so the loop is strictly sequential and runs over one bar
//! snapshot taken before it starts, never refreshed mid-loop.

use super::{Cutoff, Evaluator, PipelineError, PipelineRunner};
use crate::data::types::DailyBar;
use crate::store::{AppendOutcome, PredictionStore};
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

/// Counters from a completed backtest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacktestReport {
    /// Simulated days iterated
    pub days: usize,
    /// Forecasts newly stored
    pub appended: usize,
    /// Days whose forecast already existed
    pub skipped_existing: usize,
    /// Days skipped for thin history
    pub skipped_insufficient: usize,
    /// Outcomes filled by the final reconciliation pass
    pub outcomes_filled: usize,
}

/// Replays the pipeline over past days to synthesize a run history
#[derive(Debug, Clone)]
pub struct BacktestDriver {
    runner: PipelineRunner,
}

impl BacktestDriver {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            runner: PipelineRunner::new(model_name),
        }
    }

    /// Run one simulated day per calendar date from `start` to `end`
    /// inclusive, then reconcile once over the full snapshot
    ///
    /// Days the forecaster cannot serve (not enough accumulated history) are
    /// skipped and the replay continues; later days succeed once the prefix
    /// is long enough.
    pub fn run<S: PredictionStore>(
        &self,
        store: &mut S,
        bars: &[DailyBar],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestReport, PipelineError> {
        if bars.is_empty() {
            return Err(PipelineError::MissingData("price series is empty".into()));
        }

        let mut report = BacktestReport::default();

        let mut day = start;
        while day <= end {
            report.days += 1;
            match self.runner.run_once(store, bars, Cutoff::At(day)) {
                Ok(outcome) => match outcome.append {
                    AppendOutcome::Inserted => {
                        info!(
                            cutoff = %day,
                            target = %outcome.target_date,
                            predicted = outcome.predicted_close,
                            "backtest day complete"
                        );
                        report.appended += 1;
                    }
                    AppendOutcome::SkippedDuplicate => {
                        info!(cutoff = %day, "forecast already recorded, skipping");
                        report.skipped_existing += 1;
                    }
                },
                Err(err) if err.is_recoverable() => {
                    warn!(cutoff = %day, %err, "skipping day");
                    report.skipped_insufficient += 1;
                }
                Err(err) => return Err(err),
            }
            day = day + Duration::days(1);
        }

        // One pass at the end is enough: reconciliation is idempotent and
        // order-independent, and nothing inside the loop could have filled
        // a day the loop itself was predicting.
        report.outcomes_filled =
            Evaluator::reconcile(store, bars).map_err(PipelineError::Store)?;

        Ok(report)
    }
}
