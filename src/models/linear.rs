//! Ordinary least squares with intercept
//!
//! Features are standardised before forming the Gram matrix `ZᵀZ` so the
//! normal equations stay well scaled when raw features differ by orders of
//! magnitude (engine capacity vs sum insured). Columns that are constant on
//! the training rows get a zero coefficient.

use faer::linalg::solvers::SpSolver;
use faer::{Mat, Side};
use tracing::debug;

use super::{validate_prediction, validate_training, Regressor};
use crate::error::TrainingError;
use crate::pipeline::FeatureMatrix;

const NAME: &str = "Linear Regression";

/// Diagonal jitter, relative to the row count, added before factorising
const RIDGE_JITTER: f64 = 1e-10;

#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    intercept: f64,
    coefficients: Vec<f64>,
    fitted: bool,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficients on the original feature scale
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<(), TrainingError> {
        validate_training(NAME, x, y)?;
        let n = x.n_rows();
        let p = x.n_features();

        let y_mean = y.iter().sum::<f64>() / n as f64;
        let mut means = vec![0.0; p];
        let mut scales = vec![0.0; p];
        for j in 0..p {
            let column = x.column(j);
            let mean = column.iter().sum::<f64>() / n as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            means[j] = mean;
            scales[j] = var.sqrt();
        }
        let active: Vec<usize> = (0..p).filter(|&j| scales[j] > 0.0).collect();
        let k = active.len();

        let mut beta_active = vec![0.0; k];
        if k > 0 {
            let z = Mat::<f64>::from_fn(n, k, |i, c| {
                let j = active[c];
                (x.rows[i][j] - means[j]) / scales[j]
            });
            let yc = Mat::<f64>::from_fn(n, 1, |i, _| y[i] - y_mean);

            let mut gram = z.transpose() * &z;
            let rhs = z.transpose() * &yc;
            for d in 0..k {
                gram[(d, d)] += RIDGE_JITTER * n as f64;
            }
            let rhs: Vec<f64> = (0..k).map(|d| rhs[(d, 0)]).collect();
            beta_active = cholesky_solve(&gram, &rhs).ok_or_else(|| TrainingError::Singular {
                model: NAME.to_string(),
            })?;
        }

        let mut coefficients = vec![0.0; p];
        for (c, &j) in active.iter().enumerate() {
            coefficients[j] = beta_active[c] / scales[j];
        }
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(means.iter())
                .map(|(b, m)| b * m)
                .sum::<f64>();

        debug!(
            intercept,
            active = k,
            dropped_constant = p - k,
            "fitted linear regression"
        );
        self.intercept = intercept;
        self.coefficients = coefficients;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<f64>, TrainingError> {
        if !self.fitted {
            return Err(TrainingError::NotFitted {
                model: NAME.to_string(),
            });
        }
        validate_prediction(NAME, x, self.coefficients.len())?;
        Ok(x.rows
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(self.coefficients.iter())
                        .map(|(v, b)| v * b)
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Solve `A x = b` for symmetric positive definite `A`.
///
/// Returns `None` when the factorisation finds a non-positive pivot or the
/// solution is not finite.
fn cholesky_solve(a: &Mat<f64>, b: &[f64]) -> Option<Vec<f64>> {
    let llt = a.cholesky(Side::Lower).ok()?;
    let rhs = Mat::<f64>::from_fn(b.len(), 1, |i, _| b[i]);
    let solution = llt.solve(&rhs);
    let out: Vec<f64> = (0..solution.nrows()).map(|i| solution[(i, 0)]).collect();
    out.iter().all(|v| v.is_finite()).then_some(out)
}
