//! Regression scores on a held-out partition

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub r2: f64,
    pub mse: f64,
    pub mae: f64,
    pub n: usize,
}

impl RegressionMetrics {
    /// Score predictions against actual values.
    ///
    /// `None` when the slices are empty or differ in length. When the actual
    /// values are constant, R² is 1.0 for a perfect fit and 0.0 otherwise.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Option<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return None;
        }
        let n = actual.len();
        let mean = actual.iter().sum::<f64>() / n as f64;

        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        let mut abs_err = 0.0;
        for (a, p) in actual.iter().zip(predicted.iter()) {
            let err = a - p;
            ss_res += err * err;
            abs_err += err.abs();
            ss_tot += (a - mean).powi(2);
        }

        let mse = ss_res / n as f64;
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Some(Self {
            rmse: mse.sqrt(),
            r2,
            mse,
            mae: abs_err / n as f64,
            n,
        })
    }
}
