//! Whole-table summary: shape, dtypes, missing counts, numeric describe and
//! the most frequent levels of text columns.

use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use super::columns::{numeric_values, text_values};
use crate::analysis::stats::{mean, quantile_sorted, sample_std, sorted_copy};
use crate::error::DataError;

/// Number of most frequent levels kept per text column
const TOP_LEVELS: usize = 5;

/// Describe-style statistics of one numeric column
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Level counts of one text column
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub distinct: usize,
    /// Most frequent levels, descending by count (ties by level)
    pub top_levels: Vec<(String, usize)>,
}

/// Summary of a loaded table
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub rows: usize,
    pub columns: usize,
    pub dtypes: Vec<(String, String)>,
    pub missing_values: Vec<(String, usize)>,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

/// Summarize a table. Column order follows the table.
pub fn summarize(df: &DataFrame) -> Result<DataSummary, DataError> {
    let mut dtypes = Vec::with_capacity(df.width());
    let mut missing_values = Vec::with_capacity(df.width());
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for column in df.get_columns() {
        let name = column.name().to_string();
        dtypes.push((name.clone(), column.dtype().to_string()));
        missing_values.push((name.clone(), column.null_count()));

        if column.dtype().is_primitive_numeric() {
            numeric.push(describe_numeric(df, &name)?);
        } else if column.dtype() == &DataType::String {
            categorical.push(describe_text(df, &name)?);
        }
    }

    Ok(DataSummary {
        rows: df.height(),
        columns: df.width(),
        dtypes,
        missing_values,
        numeric,
        categorical,
    })
}

fn describe_numeric(df: &DataFrame, name: &str) -> Result<NumericSummary, DataError> {
    let observed: Vec<f64> = numeric_values(df, name)?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    let sorted = sorted_copy(&observed);

    Ok(NumericSummary {
        column: name.to_string(),
        count: observed.len(),
        mean: mean(&observed),
        std: sample_std(&observed),
        min: sorted.first().copied(),
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    })
}

fn describe_text(df: &DataFrame, name: &str) -> Result<CategoricalSummary, DataError> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in text_values(df, name)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let distinct = counts.len();
    let mut levels: Vec<(String, usize)> = counts.into_iter().collect();
    levels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    levels.truncate(TOP_LEVELS);

    Ok(CategoricalSummary {
        column: name.to_string(),
        distinct,
        top_levels: levels,
    })
}
