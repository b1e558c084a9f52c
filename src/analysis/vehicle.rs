//! Claims rollup per vehicle make and model

use polars::prelude::DataFrame;
use serde::Serialize;

use super::group_rows;
use crate::error::DataError;
use crate::pipeline::columns::numeric_values;

#[derive(Debug, Clone, Serialize)]
pub struct VehicleClaims {
    pub make: String,
    pub model: String,
    pub claims_sum: f64,
    pub claims_mean: Option<f64>,
    /// Rows with an observed claim value
    pub claims_count: usize,
    pub premium_sum: f64,
}

/// Claim sum, mean and count plus premium sum per (make, model) pair.
///
/// Pairs appear in order of first occurrence; missing make or model values
/// form their own group.
pub fn vehicle_claims(
    df: &DataFrame,
    make: &str,
    model: &str,
    claims: &str,
    premium: &str,
) -> Result<Vec<VehicleClaims>, DataError> {
    let claim_values = numeric_values(df, claims)?;
    let premium_values = numeric_values(df, premium)?;

    Ok(group_rows(df, &[make.to_string(), model.to_string()])?
        .into_iter()
        .map(|(mut key, rows)| {
            let observed: Vec<f64> = rows
                .iter()
                .filter_map(|&i| claim_values[i])
                .filter(|v| !v.is_nan())
                .collect();
            let claims_sum: f64 = observed.iter().sum();
            let model_name = key.pop().unwrap_or_default();
            let make_name = key.pop().unwrap_or_default();
            VehicleClaims {
                make: make_name,
                model: model_name,
                claims_sum,
                claims_mean: (!observed.is_empty()).then(|| claims_sum / observed.len() as f64),
                claims_count: observed.len(),
                premium_sum: super::sum_at(&premium_values, &rows),
            }
        })
        .collect())
}
