//! Ordinary least squares linear regression
//!
//! The baseline predictor behind the daily forecast. Solves the normal
//! equations by Cholesky decomposition after standardizing each column;
//! the feature table's moving averages are near-linear functions of the
//! close, so the solve carries a small sample-scaled ridge term to keep the
//! system positive definite.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors that can occur during linear regression
#[derive(Error, Debug)]
pub enum LinearRegressionError {
    #[error("matrix is singular and cannot be solved")]
    SingularMatrix,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("model has not been fitted yet")]
    NotFitted,
}

/// Linear regression model fitted by ordinary least squares
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    /// Coefficients in the original feature space
    pub coefficients: Option<Array1<f64>>,
    /// Intercept term
    pub intercept: Option<f64>,
    /// In-sample R-squared
    pub r_squared: Option<f64>,
}

impl LinearRegression {
    /// Create an unfitted model
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on a feature matrix and target vector
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), LinearRegressionError> {
        let n = x.nrows();
        if n != y.len() {
            return Err(LinearRegressionError::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }
        if n == 0 {
            return Err(LinearRegressionError::DimensionMismatch {
                expected: 1,
                got: 0,
            });
        }

        let p = x.ncols();

        // Standardize columns; a constant column gets unit scale and a zero
        // coefficient falls out of the regularized solve
        let mut means = Array1::<f64>::zeros(p);
        let mut scales = Array1::<f64>::ones(p);
        for j in 0..p {
            let col = x.column(j);
            let mean = col.sum() / n as f64;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            means[j] = mean;
            if var.sqrt() > 1e-12 {
                scales[j] = var.sqrt();
            }
        }

        let mut z = x.clone();
        for j in 0..p {
            let mut col = z.column_mut(j);
            col.mapv_inplace(|v| (v - means[j]) / scales[j]);
        }

        let y_mean = y.sum() / n as f64;
        let y_centered = y.mapv(|v| v - y_mean);

        // Normal equations on the standardized system
        let zt = z.t();
        let mut ztz = zt.dot(&z);
        let zty = zt.dot(&y_centered);

        let lambda = 1e-8 * n as f64;
        for i in 0..p {
            ztz[[i, i]] += lambda;
        }

        let beta = cholesky_solve(&ztz, &zty)?;

        let coefficients = Array1::from_shape_fn(p, |j| beta[j] / scales[j]);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(means.iter())
                .map(|(c, m)| c * m)
                .sum::<f64>();

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);

        let predictions = self.predict(x)?;
        let ss_res: f64 = y
            .iter()
            .zip(predictions.iter())
            .map(|(&yi, &pi)| (yi - pi).powi(2))
            .sum();
        let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
        self.r_squared = Some(if ss_tot > 1e-10 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        });

        Ok(())
    }

    /// Predict for a batch of rows
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, LinearRegressionError> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(LinearRegressionError::NotFitted)?;
        let intercept = self.intercept.ok_or(LinearRegressionError::NotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(LinearRegressionError::DimensionMismatch {
                expected: coefficients.len(),
                got: x.ncols(),
            });
        }

        Ok(x.dot(coefficients) + intercept)
    }

    /// Predict for a single feature vector
    pub fn predict_one(&self, x: &Array1<f64>) -> Result<f64, LinearRegressionError> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(LinearRegressionError::NotFitted)?;
        let intercept = self.intercept.ok_or(LinearRegressionError::NotFitted)?;

        if x.len() != coefficients.len() {
            return Err(LinearRegressionError::DimensionMismatch {
                expected: coefficients.len(),
                got: x.len(),
            });
        }

        Ok(x.dot(coefficients) + intercept)
    }
}

/// Solve `a * x = b` for symmetric positive definite `a` by Cholesky
/// decomposition with forward/backward substitution
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, LinearRegressionError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return Err(LinearRegressionError::SingularMatrix);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L' * x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Ok(x)
}
