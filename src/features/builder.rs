//! Point-in-time feature and label construction
//!
//! Every derived column on a row dated T is computed from bars dated at or
//! before T: trailing windows only, no centered or forward-looking
//! statistics. The label (next day's close) is the one exception and is
//! therefore `None` on the final row, which is the row a caller forecasts
//! from rather than trains on.

use crate::data::types::DailyBar;
use chrono::NaiveDate;
use ndarray::Array1;

/// Moving-average window sizes, in trading days
pub const MA_WINDOWS: [usize; 3] = [3, 7, 14];
/// Rolling volatility window, in trading days
pub const VOL_WINDOW: usize = 7;

/// One feature/label row of the training table
///
/// Derived fields are `None` until the trailing window behind them has
/// enough history.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    /// One-day simple return, `None` on the first row of the series
    pub daily_return: Option<f64>,
    pub ma_3: Option<f64>,
    pub ma_7: Option<f64>,
    pub ma_14: Option<f64>,
    /// Trailing sample standard deviation of close
    pub vol_7: Option<f64>,
    /// Next day's close; `None` on the most recent row by construction
    pub target: Option<f64>,
}

impl FeatureRow {
    /// Feature column names, in feature-vector order
    pub const FEATURE_NAMES: [&'static str; 6] =
        ["close", "return", "ma_3", "ma_7", "ma_14", "vol_7"];

    /// Names of features still missing on this row
    pub fn missing_features(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.daily_return.is_none() {
            missing.push("return");
        }
        if self.ma_3.is_none() {
            missing.push("ma_3");
        }
        if self.ma_7.is_none() {
            missing.push("ma_7");
        }
        if self.ma_14.is_none() {
            missing.push("ma_14");
        }
        if self.vol_7.is_none() {
            missing.push("vol_7");
        }
        missing
    }

    /// Whether every feature window has enough history
    pub fn is_complete(&self) -> bool {
        self.missing_features().is_empty()
    }

    /// Whether this row can be used for training (features and label present)
    pub fn is_trainable(&self) -> bool {
        self.is_complete() && self.target.is_some()
    }

    /// Feature vector in `FEATURE_NAMES` order, if complete
    pub fn feature_vector(&self) -> Option<Array1<f64>> {
        Some(Array1::from_vec(vec![
            self.close,
            self.daily_return?,
            self.ma_3?,
            self.ma_7?,
            self.ma_14?,
            self.vol_7?,
        ]))
    }
}

/// Derives the feature/label table from a raw price series
#[derive(Debug, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Build one feature row per bar, in date order
    ///
    /// The input is sorted by date first, so a reordered copy of the same
    /// bars yields an identical table.
    pub fn build(bars: &[DailyBar]) -> Vec<FeatureRow> {
        let mut bars = bars.to_vec();
        bars.sort_by_key(|b| b.date);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ma_3 = Self::rolling_mean(&closes, MA_WINDOWS[0]);
        let ma_7 = Self::rolling_mean(&closes, MA_WINDOWS[1]);
        let ma_14 = Self::rolling_mean(&closes, MA_WINDOWS[2]);
        let vol_7 = Self::rolling_std(&closes, VOL_WINDOW);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| FeatureRow {
                date: bar.date,
                close: bar.close,
                daily_return: (i > 0).then(|| (closes[i] - closes[i - 1]) / closes[i - 1]),
                ma_3: ma_3[i],
                ma_7: ma_7[i],
                ma_14: ma_14[i],
                vol_7: vol_7[i],
                target: closes.get(i + 1).copied(),
            })
            .collect()
    }

    /// Trailing mean over the last `period` values ending at each index
    fn rolling_mean(data: &[f64], period: usize) -> Vec<Option<f64>> {
        data.iter()
            .enumerate()
            .map(|(i, _)| {
                (i + 1 >= period).then(|| {
                    let window = &data[i + 1 - period..=i];
                    window.iter().sum::<f64>() / period as f64
                })
            })
            .collect()
    }

    /// Trailing sample standard deviation (ddof = 1) over the last `period`
    /// values ending at each index
    fn rolling_std(data: &[f64], period: usize) -> Vec<Option<f64>> {
        data.iter()
            .enumerate()
            .map(|(i, _)| {
                (i + 1 >= period).then(|| {
                    let window = &data[i + 1 - period..=i];
                    let mean = window.iter().sum::<f64>() / period as f64;
                    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
                        / (period - 1) as f64;
                    variance.sqrt()
                })
            })
            .collect()
    }
}
