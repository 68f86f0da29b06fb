//! Accuracy summary over the stored forecast history

use crate::store::Forecast;

/// Aggregate error metrics over reconciled forecasts
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastAccuracy {
    /// Records with a realized outcome
    pub n_evaluated: usize,
    /// Records still waiting on their target day
    pub n_pending: usize,
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute percentage error
    pub mape: f64,
}

impl ForecastAccuracy {
    /// Summarize a record set; `None` until at least one forecast has been
    /// evaluated
    pub fn from_records(records: &[Forecast]) -> Option<Self> {
        let evaluated: Vec<&Forecast> = records.iter().filter(|r| r.is_evaluated()).collect();
        if evaluated.is_empty() {
            return None;
        }

        let n = evaluated.len() as f64;
        let mae = evaluated.iter().filter_map(|r| r.abs_error).sum::<f64>() / n;
        let rmse = (evaluated
            .iter()
            .filter_map(|r| r.abs_error)
            .map(|e| e * e)
            .sum::<f64>()
            / n)
            .sqrt();
        let mape = evaluated.iter().filter_map(|r| r.pct_error).sum::<f64>() / n;

        Some(Self {
            n_evaluated: evaluated.len(),
            n_pending: records.len() - evaluated.len(),
            mae,
            rmse,
            mape,
        })
    }

    /// One-line report for CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} evaluated, {} pending | MAE {:.2} | RMSE {:.2} | MAPE {:.2}%",
            self.n_evaluated, self.n_pending, self.mae, self.rmse, self.mape
        )
    }
}
