//! Per-column outlier flags by interquartile range or z-score

use std::fmt;
use std::str::FromStr;

use polars::prelude::DataFrame;
use serde::Serialize;

use super::stats::{mean, quantile_sorted, sample_std, sorted_copy};
use crate::error::DataError;
use crate::pipeline::columns::numeric_values;

/// Default z-score cut-off
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Fence multiplier applied to the IQR
pub const IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum OutlierMethod {
    /// Outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`
    #[default]
    Iqr,
    /// `|x - mean| / std > threshold` with the sample standard deviation
    ZScore { threshold: f64 },
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::Iqr => write!(f, "iqr"),
            OutlierMethod::ZScore { threshold } => write!(f, "zscore (|z| > {})", threshold),
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z-score" | "z" => Ok(OutlierMethod::ZScore {
                threshold: DEFAULT_Z_THRESHOLD,
            }),
            _ => Err(format!("Invalid outlier method '{}'. Use 'iqr' or 'zscore'", s)),
        }
    }
}

/// Rows flagged in one column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// Row positions in the input table, ascending
    pub rows: Vec<usize>,
}

/// Flag outliers in each column independently.
///
/// Missing cells are never flagged. A row may appear under several columns.
pub fn detect_outliers(
    df: &DataFrame,
    columns: &[String],
    method: OutlierMethod,
) -> Result<Vec<ColumnOutliers>, DataError> {
    columns
        .iter()
        .map(|name| {
            let values = numeric_values(df, name)?;
            Ok(flag_column(name, &values, method))
        })
        .collect()
}

fn flag_column(name: &str, values: &[Option<f64>], method: OutlierMethod) -> ColumnOutliers {
    let observed: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();

    let bounds = match method {
        OutlierMethod::Iqr => {
            let sorted = sorted_copy(&observed);
            match (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75)) {
                (Some(q1), Some(q3)) => {
                    let iqr = q3 - q1;
                    Some((q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr))
                }
                _ => None,
            }
        }
        OutlierMethod::ZScore { threshold } => match (mean(&observed), sample_std(&observed)) {
            // Constant columns have no spread to measure against
            (Some(m), Some(s)) if s > 0.0 => Some((m - threshold * s, m + threshold * s)),
            _ => None,
        },
    };

    let rows = match bounds {
        Some((lower, upper)) => values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match v {
                Some(x) if *x < lower || *x > upper => Some(i),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    };

    ColumnOutliers {
        column: name.to_string(),
        lower_bound: bounds.map(|b| b.0),
        upper_bound: bounds.map(|b| b.1),
        rows,
    }
}
