//! CSV persistence for the daily price series

use super::types::{validate_series, DailyBar};
use anyhow::{Context, Result};
use csv::{Reader, Writer};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Load bars from a CSV file, sort by date and validate the series
pub fn load_bars<P: AsRef<Path>>(path: P) -> Result<Vec<DailyBar>> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open price file {:?}", path.as_ref()))?;

    let mut reader = Reader::from_reader(file);
    let mut bars = Vec::new();

    for result in reader.deserialize() {
        let bar: DailyBar = result.context("failed to parse price row")?;
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    validate_series(&bars)?;

    Ok(bars)
}

/// Save bars to a CSV file, creating parent directories as needed
pub fn save_bars<P: AsRef<Path>>(bars: &[DailyBar], path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data directory {:?}", parent))?;
        }
    }

    let file = File::create(&path)
        .with_context(|| format!("failed to create price file {:?}", path.as_ref()))?;

    let mut writer = Writer::from_writer(file);
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;

    Ok(())
}

/// Merge freshly fetched bars into stored history
///
/// Union by date with the fresh bar winning, so repeated fetches extend the
/// series instead of truncating it to the API window.
pub fn merge_bars(existing: &[DailyBar], fresh: &[DailyBar]) -> Vec<DailyBar> {
    let mut by_date: BTreeMap<_, _> = existing.iter().map(|b| (b.date, *b)).collect();
    for bar in fresh {
        by_date.insert(bar.date, *bar);
    }
    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn bar(d: u32, close: f64) -> DailyBar {
        let date = NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        DailyBar::new(date, close, close + 2.0, close - 2.0, close, 5000.0)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let bars = vec![bar(1, 100.0), bar(2, 102.5), bar(3, 101.25)];

        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");

        save_bars(&bars, &path).unwrap();
        let loaded = load_bars(&path).unwrap();

        assert_eq!(loaded, bars);
    }

    #[test]
    fn test_load_sorts_by_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");

        save_bars(&[bar(3, 103.0), bar(1, 101.0), bar(2, 102.0)], &path).unwrap();
        let loaded = load_bars(&path).unwrap();

        let dates: Vec<_> = loaded.iter().map(|b| b.date).collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(load_bars(dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_merge_prefers_fresh_bars() {
        let existing = vec![bar(1, 100.0), bar(2, 102.0)];
        let fresh = vec![bar(2, 103.0), bar(3, 104.0)];

        let merged = merge_bars(&existing, &fresh);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].close, 103.0);
        assert_eq!(merged[2].close, 104.0);
    }
}
