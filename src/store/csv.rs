//! File-backed prediction store
//!
//! Records live in memory and the whole history file is rewritten after each
//! mutating call, so a record is either fully present with its final field
//! values or absent. The read-modify-write cycle assumes a single writing
//! process.

use super::{apply_outcome, has_record, AppendOutcome, Forecast, PredictionStore};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Prediction history persisted as a CSV file
#[derive(Debug)]
pub struct CsvPredictionStore {
    path: PathBuf,
    records: Vec<Forecast>,
}

impl CsvPredictionStore {
    /// Open a store at `path`
    ///
    /// An absent file is an empty history (the first run creates it); an
    /// existing file must parse completely.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut records = Vec::new();

        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("failed to open prediction history {:?}", path))?;
            let mut reader = Reader::from_reader(file);
            for result in reader.deserialize() {
                let record: Forecast = result.context("failed to parse prediction row")?;
                records.push(record);
            }
        }

        Ok(Self { path, records })
    }

    /// Rewrite the history file from the in-memory records
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create data directory {:?}", parent))?;
            }
        }

        let file = File::create(&self.path)
            .with_context(|| format!("failed to write prediction history {:?}", self.path))?;
        let mut writer = Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl PredictionStore for CsvPredictionStore {
    fn records(&self) -> &[Forecast] {
        &self.records
    }

    fn append(&mut self, forecast: Forecast) -> Result<AppendOutcome> {
        if has_record(&self.records, &forecast.model_name, forecast.target_date) {
            return Ok(AppendOutcome::SkippedDuplicate);
        }

        self.records.push(forecast);
        self.persist()?;
        Ok(AppendOutcome::Inserted)
    }

    fn reconcile_outcome(&mut self, target_date: NaiveDate, actual_close: f64) -> Result<usize> {
        let updated = apply_outcome(&mut self.records, target_date, actual_close);
        if updated > 0 {
            self.persist()?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn forecast(target_day: u32, predicted: f64) -> Forecast {
        let target = NaiveDate::from_ymd_opt(2024, 5, target_day).unwrap();
        let generated = (target - chrono::Duration::days(1))
            .and_hms_opt(0, 5, 0)
            .unwrap();
        Forecast::new(generated, target, "linear_baseline", predicted)
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempdir().unwrap();
        let store = CsvPredictionStore::load(dir.path().join("predictions.csv")).unwrap();
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_append_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = CsvPredictionStore::load(dir.path().join("predictions.csv")).unwrap();

        let first = store.append(forecast(2, 100.0)).unwrap();
        let second = store.append(forecast(2, 999.0)).unwrap();

        assert_eq!(first, AppendOutcome::Inserted);
        assert_eq!(second, AppendOutcome::SkippedDuplicate);
        assert_eq!(store.records().len(), 1);
        // the original prediction survives the duplicate call
        assert_eq!(store.records()[0].predicted_close, 100.0);
    }

    #[test]
    fn test_round_trip_preserves_null_outcomes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictions.csv");

        {
            let mut store = CsvPredictionStore::load(&path).unwrap();
            store.append(forecast(2, 100.0)).unwrap();
            store.append(forecast(3, 101.5)).unwrap();
            store
                .reconcile_outcome(forecast(2, 0.0).target_date, 102.0)
                .unwrap();
        }

        // simulated restart
        let reloaded = CsvPredictionStore::load(&path).unwrap();
        let records = reloaded.records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].actual_close, Some(102.0));
        assert_eq!(records[0].abs_error, Some(2.0));
        assert!(records[1].actual_close.is_none());
        assert!(records[1].abs_error.is_none());
        assert!(records[1].pct_error.is_none());
    }

    #[test]
    fn test_reconcile_touches_only_matching_date() {
        let dir = tempdir().unwrap();
        let mut store = CsvPredictionStore::load(dir.path().join("predictions.csv")).unwrap();
        store.append(forecast(2, 100.0)).unwrap();
        store.append(forecast(3, 101.0)).unwrap();

        let updated = store
            .reconcile_outcome(forecast(2, 0.0).target_date, 102.0)
            .unwrap();

        assert_eq!(updated, 1);
        assert!(store.records()[0].is_evaluated());
        assert!(!store.records()[1].is_evaluated());
    }

    #[test]
    fn test_insertion_order_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictions.csv");

        let mut store = CsvPredictionStore::load(&path).unwrap();
        for day in [5, 2, 9] {
            store.append(forecast(day, 100.0 + day as f64)).unwrap();
        }

        let reloaded = CsvPredictionStore::load(&path).unwrap();
        let days: Vec<u32> = reloaded
            .records()
            .iter()
            .map(|r| r.target_date.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(days, vec![5, 2, 9]);
    }
}
