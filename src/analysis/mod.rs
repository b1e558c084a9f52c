//! EDA analyses over the raw record table
//!
//! Every analysis is a pure function of the table and its arguments; results
//! are small serialisable structs consumed by the report and chart layers.

pub mod correlation;
pub mod distribution;
pub mod loss_ratio;
pub mod outliers;
pub mod stats;
pub mod temporal;
pub mod vehicle;

pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use distribution::{distribution_stats, DistributionStats};
pub use loss_ratio::{grouped_loss_ratio, loss_ratio, loss_ratio_by_category, GroupLossRatio, LossRatio};
pub use outliers::{detect_outliers, ColumnOutliers, OutlierMethod};
pub use temporal::{temporal_trend, MonthlyAggregate};
pub use vehicle::{vehicle_claims, VehicleClaims};

use std::collections::HashMap;

use polars::prelude::*;

use crate::error::DataError;
use crate::pipeline::columns::text_values;

/// Label used for a missing group key
pub const MISSING_LABEL: &str = "MISSING";

/// Row indices per distinct key, keys in order of first appearance.
pub(crate) fn group_rows(df: &DataFrame, columns: &[String]) -> Result<Vec<(Vec<String>, Vec<usize>)>, DataError> {
    if columns.is_empty() {
        return Err(DataError::InvalidParameter(
            "at least one grouping column is required".to_string(),
        ));
    }
    let keys: Vec<Vec<Option<String>>> = columns
        .iter()
        .map(|name| text_values(df, name))
        .collect::<Result<_, _>>()?;

    let mut position: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<String>, Vec<usize>)> = Vec::new();
    for row in 0..df.height() {
        let key: Vec<String> = keys
            .iter()
            .map(|col| col[row].clone().unwrap_or_else(|| MISSING_LABEL.to_string()))
            .collect();
        match position.get(&key) {
            Some(&at) => groups[at].1.push(row),
            None => {
                position.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    Ok(groups)
}

/// Sum of the observed (non-missing, non-NaN) values at the given rows
pub(crate) fn sum_at(values: &[Option<f64>], rows: &[usize]) -> f64 {
    rows.iter()
        .filter_map(|&i| values[i])
        .filter(|v| !v.is_nan())
        .sum()
}
