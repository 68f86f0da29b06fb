//! Append-only prediction history
//!
//! Forecasts are identified by `(model_name, target_date)`: appending an
//! existing key is a reported no-op, outcome fields are filled at most once,
//! and records are never deleted. The store is the only writer of the
//! forecast collection; a single process at a time is assumed.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod csv;
pub mod memory;

pub use self::csv::CsvPredictionStore;
pub use memory::InMemoryPredictionStore;

/// Serde format for `date_generated`, matching the stored history files
mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One stored forecast
///
/// Serde field order matches the history CSV columns:
/// `date_generated,target_date,model_name,predicted_close,actual_close,abs_error,pct_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// When the forecast was produced; synthetic in backtest replays
    #[serde(with = "timestamp_format")]
    pub date_generated: NaiveDateTime,
    /// The day being predicted (cutoff + 1)
    pub target_date: NaiveDate,
    pub model_name: String,
    pub predicted_close: f64,
    /// Realized close, filled by reconciliation once observable
    pub actual_close: Option<f64>,
    pub abs_error: Option<f64>,
    pub pct_error: Option<f64>,
}

impl Forecast {
    /// A fresh forecast with unresolved outcome fields
    pub fn new(
        date_generated: NaiveDateTime,
        target_date: NaiveDate,
        model_name: impl Into<String>,
        predicted_close: f64,
    ) -> Self {
        Self {
            date_generated,
            target_date,
            model_name: model_name.into(),
            predicted_close,
            actual_close: None,
            abs_error: None,
            pct_error: None,
        }
    }

    /// Whether the outcome has been reconciled
    pub fn is_evaluated(&self) -> bool {
        self.actual_close.is_some()
    }

    /// Fill outcome fields from the realized close
    ///
    /// Caller contract: `actual_close > 0` (guaranteed by series validation).
    fn fill_outcome(&mut self, actual_close: f64) {
        let abs_error = (actual_close - self.predicted_close).abs();
        self.actual_close = Some(actual_close);
        self.abs_error = Some(abs_error);
        self.pct_error = Some(abs_error / actual_close * 100.0);
    }
}

/// Result of an append call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// New record stored
    Inserted,
    /// A record with the same (model_name, target_date) already exists;
    /// nothing was written
    SkippedDuplicate,
}

/// Contract for the forecast collection
///
/// Implementations own the records and are the sole writer; append and
/// reconcile mutate at single-record granularity and report rather than fail
/// on key collisions.
pub trait PredictionStore {
    /// All records in insertion order
    fn records(&self) -> &[Forecast];

    /// Idempotent insert keyed by (model_name, target_date)
    fn append(&mut self, forecast: Forecast) -> Result<AppendOutcome>;

    /// Fill outcomes for every unresolved record with this target date;
    /// returns the number of records updated
    fn reconcile_outcome(&mut self, target_date: NaiveDate, actual_close: f64) -> Result<usize>;
}

/// Key collision check shared by store implementations
pub(crate) fn has_record(records: &[Forecast], model_name: &str, target_date: NaiveDate) -> bool {
    records
        .iter()
        .any(|r| r.model_name == model_name && r.target_date == target_date)
}

/// Outcome fill shared by store implementations; touches only unresolved
/// records with the matching target date
pub(crate) fn apply_outcome(
    records: &mut [Forecast],
    target_date: NaiveDate,
    actual_close: f64,
) -> usize {
    let mut updated = 0;
    for record in records
        .iter_mut()
        .filter(|r| r.target_date == target_date && !r.is_evaluated())
    {
        record.fill_outcome(actual_close);
        updated += 1;
    }
    updated
}
