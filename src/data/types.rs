//! Core data types for the daily price series
//!
//! The pipeline operates on daily OHLCV bars keyed by calendar date. A valid
//! series has strictly increasing unique dates and positive closing prices;
//! `validate_series` enforces both wherever bars enter the system.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of OHLCV data
///
/// Serde field names match the stored CSV schema
/// (`Date,Open,High,Low,Close,Volume`), so existing price files load
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Calendar day (UTC)
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Opening price
    #[serde(rename = "Open")]
    pub open: f64,
    /// Highest price
    #[serde(rename = "High")]
    pub high: f64,
    /// Lowest price
    #[serde(rename = "Low")]
    pub low: f64,
    /// Closing price
    #[serde(rename = "Close")]
    pub close: f64,
    /// Trading volume
    #[serde(rename = "Volume")]
    pub volume: f64,
}

impl DailyBar {
    /// Create a new daily bar
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Intraday range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Close-over-open percentage change
    pub fn pct_change(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            (self.close - self.open) / self.open * 100.0
        }
    }
}

/// Check series invariants: strictly increasing unique dates, close > 0
pub fn validate_series(bars: &[DailyBar]) -> Result<()> {
    for window in bars.windows(2) {
        if window[1].date <= window[0].date {
            bail!(
                "price series dates must be strictly increasing: {} followed by {}",
                window[0].date,
                window[1].date
            );
        }
    }
    if let Some(bar) = bars.iter().find(|b| b.close <= 0.0) {
        bail!("non-positive close {} on {}", bar.close, bar.date);
    }
    Ok(())
}

/// Restrict a series to bars dated at or before `cutoff`
///
/// This is the point-in-time boundary: everything downstream of this filter
/// sees no bar after the cutoff.
pub fn visible_through(bars: &[DailyBar], cutoff: NaiveDate) -> Vec<DailyBar> {
    bars.iter().copied().filter(|b| b.date <= cutoff).collect()
}

/// Closing price on an exact date, if that bar exists
pub fn close_on(bars: &[DailyBar], date: NaiveDate) -> Option<f64> {
    bars.iter().find(|b| b.date == date).map(|b| b.close)
}

/// Latest date present in the series
pub fn latest_date(bars: &[DailyBar]) -> Option<NaiveDate> {
    bars.iter().map(|b| b.date).max()
}
