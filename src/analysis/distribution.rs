//! Distribution moments per numeric column

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::warn;

use super::stats::{excess_kurtosis, mean, sample_std, skewness};
use crate::error::DataError;
use crate::pipeline::columns::{numeric_values, require_column};

#[derive(Debug, Clone, Serialize)]
pub struct DistributionStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Mean, sample standard deviation, skewness and excess kurtosis.
///
/// Requested columns that exist but are not numeric are skipped with a
/// warning; absent columns are an error.
pub fn distribution_stats(df: &DataFrame, columns: &[String]) -> Result<Vec<DistributionStats>, DataError> {
    let mut stats = Vec::with_capacity(columns.len());
    for name in columns {
        let column = require_column(df, name)?;
        if !column.dtype().is_primitive_numeric() {
            warn!(column = %name, dtype = %column.dtype(), "skipping non-numeric column");
            continue;
        }

        let observed: Vec<f64> = numeric_values(df, name)?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        stats.push(DistributionStats {
            column: name.clone(),
            count: observed.len(),
            mean: mean(&observed),
            std: sample_std(&observed),
            skewness: skewness(&observed),
            kurtosis: excess_kurtosis(&observed),
        });
    }
    Ok(stats)
}
