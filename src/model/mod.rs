//! Regression models and the forecasting wrapper

pub mod forecaster;
pub mod linear;

pub use forecaster::{ForecastError, Forecaster, Regressor};
pub use linear::{LinearRegression, LinearRegressionError};

/// Model name recorded with every forecast from the linear baseline
pub const LINEAR_BASELINE: &str = "linear_baseline";
