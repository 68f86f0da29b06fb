//! Reconciliation of stored forecasts against realized prices

use crate::data::types::{close_on, DailyBar};
use crate::store::PredictionStore;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::info;

/// Fills in outcomes for forecasts whose target day has since been observed
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Reconcile every unresolved forecast that has a realized bar
    ///
    /// Forecasts for days not yet present in the series are left untouched;
    /// that is the expected steady state for the most recent forecasts, not
    /// an error. Returns the number of records updated.
    pub fn reconcile<S: PredictionStore>(store: &mut S, bars: &[DailyBar]) -> Result<usize> {
        let pending_dates: BTreeSet<NaiveDate> = store
            .records()
            .iter()
            .filter(|r| !r.is_evaluated())
            .map(|r| r.target_date)
            .collect();

        let mut updated = 0;
        for date in pending_dates {
            if let Some(actual_close) = close_on(bars, date) {
                let n = store.reconcile_outcome(date, actual_close)?;
                if n > 0 {
                    info!(target_date = %date, actual_close, "forecast evaluated");
                }
                updated += n;
            }
        }

        Ok(updated)
    }
}
