//! In-memory prediction store
//!
//! Same contract as the file-backed store, without persistence. Used by
//! tests and ephemeral runs.

use super::{apply_outcome, has_record, AppendOutcome, Forecast, PredictionStore};
use anyhow::Result;
use chrono::NaiveDate;

/// Prediction history held in memory only
#[derive(Debug, Default)]
pub struct InMemoryPredictionStore {
    records: Vec<Forecast>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PredictionStore for InMemoryPredictionStore {
    fn records(&self) -> &[Forecast] {
        &self.records
    }

    fn append(&mut self, forecast: Forecast) -> Result<AppendOutcome> {
        if has_record(&self.records, &forecast.model_name, forecast.target_date) {
            return Ok(AppendOutcome::SkippedDuplicate);
        }
        self.records.push(forecast);
        Ok(AppendOutcome::Inserted)
    }

    fn reconcile_outcome(&mut self, target_date: NaiveDate, actual_close: f64) -> Result<usize> {
        Ok(apply_outcome(&mut self.records, target_date, actual_close))
    }
}
