//! Training and one-step prediction contract around a regressor
//!
//! The regression algorithm itself is a collaborator behind the [`Regressor`]
//! trait; the Forecaster owns the parts with invariants: dropping rows whose
//! trailing windows are incomplete, training on (features, next-day close)
//! pairs, and forecasting strictly from the latest row.

use crate::features::FeatureRow;
use crate::model::linear::LinearRegression;
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Any regression algorithm with fit/predict capability
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> anyhow::Result<()>;
    fn predict_one(&self, x: &Array1<f64>) -> anyhow::Result<f64>;
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> anyhow::Result<()> {
        LinearRegression::fit(self, x, y)?;
        Ok(())
    }

    fn predict_one(&self, x: &Array1<f64>) -> anyhow::Result<f64> {
        Ok(LinearRegression::predict_one(self, x)?)
    }
}

/// Errors from training or forecasting
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("no usable training rows after dropping incomplete windows")]
    InsufficientData,

    #[error("latest row ({date}) is missing features: {missing:?}")]
    InsufficientHistory {
        date: NaiveDate,
        missing: Vec<&'static str>,
    },

    #[error(transparent)]
    Model(#[from] anyhow::Error),
}

/// One-step-ahead forecaster over a feature table
#[derive(Debug)]
pub struct Forecaster<R: Regressor> {
    model: R,
}

impl Forecaster<LinearRegression> {
    /// Forecaster backed by the linear baseline model
    pub fn linear_baseline() -> Self {
        Self::new(LinearRegression::new())
    }
}

impl<R: Regressor> Forecaster<R> {
    pub fn new(model: R) -> Self {
        Self { model }
    }

    /// Access the wrapped model (e.g. to report fit diagnostics)
    pub fn model(&self) -> &R {
        &self.model
    }

    /// Train on every row with complete features and a known next-day close
    ///
    /// Returns the number of rows trained on.
    pub fn fit(&mut self, rows: &[FeatureRow]) -> Result<usize, ForecastError> {
        let trainable: Vec<(Array1<f64>, f64)> = rows
            .iter()
            .filter_map(|row| {
                let features = row.feature_vector()?;
                let target = row.target?;
                Some((features, target))
            })
            .collect();

        if trainable.is_empty() {
            return Err(ForecastError::InsufficientData);
        }

        let n = trainable.len();
        let p = FeatureRow::FEATURE_NAMES.len();
        let mut x = Array2::<f64>::zeros((n, p));
        let mut y = Array1::<f64>::zeros(n);
        for (i, (features, target)) in trainable.into_iter().enumerate() {
            x.row_mut(i).assign(&features);
            y[i] = target;
        }

        self.model.fit(&x, &y)?;
        Ok(n)
    }

    /// Forecast the close one step past the latest row
    ///
    /// The latest row by date is "today": its label is unknown, but all its
    /// feature windows must be filled.
    pub fn predict_next(&self, rows: &[FeatureRow]) -> Result<f64, ForecastError> {
        let last = rows
            .iter()
            .max_by_key(|r| r.date)
            .ok_or(ForecastError::InsufficientData)?;

        let features = last
            .feature_vector()
            .ok_or_else(|| ForecastError::InsufficientHistory {
                date: last.date,
                missing: last.missing_features(),
            })?;

        Ok(self.model.predict_one(&features)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::DailyBar;
    use crate::features::FeatureBuilder;

    fn trend_rows(len: usize) -> Vec<FeatureRow> {
        let bars: Vec<DailyBar> = (0..len)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                let close = 100.0 + 2.0 * i as f64;
                DailyBar::new(date, close, close + 1.0, close - 1.0, close, 1000.0)
            })
            .collect();
        FeatureBuilder::build(&bars)
    }

    /// Records what it saw; predicts a constant
    struct StubRegressor {
        fitted_rows: usize,
    }

    impl Regressor for StubRegressor {
        fn fit(&mut self, x: &Array2<f64>, _y: &Array1<f64>) -> anyhow::Result<()> {
            self.fitted_rows = x.nrows();
            Ok(())
        }

        fn predict_one(&self, _x: &Array1<f64>) -> anyhow::Result<f64> {
            Ok(42.0)
        }
    }

    #[test]
    fn test_fit_drops_incomplete_rows() {
        let rows = trend_rows(20);
        let mut forecaster = Forecaster::new(StubRegressor { fitted_rows: 0 });

        let n = forecaster.fit(&rows).unwrap();

        // 20 rows, windows complete from index 13, final row has no label
        assert_eq!(n, 6);
        assert_eq!(forecaster.model().fitted_rows, 6);
    }

    #[test]
    fn test_fit_with_short_history_fails() {
        let rows = trend_rows(10);
        let mut forecaster = Forecaster::linear_baseline();

        assert!(matches!(
            forecaster.fit(&rows),
            Err(ForecastError::InsufficientData)
        ));
    }

    #[test]
    fn test_predict_next_requires_complete_latest_row() {
        let rows = trend_rows(10);
        let forecaster = Forecaster::new(StubRegressor { fitted_rows: 0 });

        match forecaster.predict_next(&rows) {
            Err(ForecastError::InsufficientHistory { missing, .. }) => {
                assert!(missing.contains(&"ma_14"));
            }
            other => panic!("expected InsufficientHistory, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_predict_next_on_empty_table() {
        let forecaster = Forecaster::linear_baseline();
        assert!(matches!(
            forecaster.predict_next(&[]),
            Err(ForecastError::InsufficientData)
        ));
    }

    #[test]
    fn test_linear_trend_extrapolation() {
        let rows = trend_rows(20);
        let mut forecaster = Forecaster::linear_baseline();
        forecaster.fit(&rows).unwrap();

        let predicted = forecaster.predict_next(&rows).unwrap();

        // closes run 100, 102, ... 138; the next step of the trend is 140
        assert!(
            (predicted - 140.0).abs() < 1.0,
            "prediction {} strayed from the trend",
            predicted
        );
    }
}
