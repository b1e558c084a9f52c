//! Row filtering ahead of claim-severity modeling
//!
//! Passes run in a fixed order: positive-target filter, numeric coercion of
//! one text column, then the required-field check. Rows are only kept or
//! dropped; the coerced column is the one column whose storage changes.

use polars::prelude::*;
use tracing::info;

use super::columns::{null_mask, numeric_values, parse_numeric_text, require_column};
use crate::error::DataError;

/// Which rows survive cleaning
#[derive(Debug, Clone)]
pub struct ClaimFilter {
    /// Rows must have this value strictly positive
    pub target: String,
    /// Text column coerced to numeric; unparseable rows are dropped
    pub coerce_numeric: Option<String>,
    /// Rows missing any of these are dropped
    pub required: Vec<String>,
}

impl Default for ClaimFilter {
    fn default() -> Self {
        Self {
            target: "TotalClaims".to_string(),
            coerce_numeric: Some("CapitalOutstanding".to_string()),
            required: vec!["TotalClaims".to_string(), "CapitalOutstanding".to_string()],
        }
    }
}

/// Cleaned table with per-pass drop counts
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: DataFrame,
    pub input_rows: usize,
    pub dropped_non_positive: usize,
    pub dropped_unparseable: usize,
    pub dropped_missing: usize,
}

/// Apply the filter passes in order.
pub fn filter_claims(df: &DataFrame, filter: &ClaimFilter) -> Result<CleanOutcome, DataError> {
    let input_rows = df.height();

    // (a) positive target; missing target never passes
    let target = numeric_values(df, &filter.target)?;
    let keep: Vec<bool> = target.iter().map(|v| matches!(v, Some(x) if *x > 0.0)).collect();
    let mut table = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let dropped_non_positive = input_rows - table.height();

    // (b) coerce on the survivors only
    let mut dropped_unparseable = 0;
    if let Some(name) = &filter.coerce_numeric {
        let column = require_column(&table, name)?;
        let coerced: Vec<Option<f64>> = if column.dtype().is_primitive_numeric() {
            numeric_values(&table, name)?
        } else if column.dtype() == &DataType::String {
            column
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_numeric_text))
                .collect()
        } else {
            return Err(DataError::WrongType {
                column: name.clone(),
                expected: "numeric or text",
                actual: column.dtype().to_string(),
            });
        };
        let was_missing = null_mask(&table, name)?;
        dropped_unparseable = coerced
            .iter()
            .zip(was_missing.iter())
            .filter(|(parsed, missing)| parsed.is_none() && !**missing)
            .count();
        table.with_column(Column::new(name.as_str().into(), coerced))?;
    }

    // (c) required fields, including rows invalidated by coercion
    let before_required = table.height();
    let mut keep = vec![true; before_required];
    for name in filter.required.iter().chain(filter.coerce_numeric.iter()) {
        for (flag, missing) in keep.iter_mut().zip(null_mask(&table, name)?) {
            if missing {
                *flag = false;
            }
        }
    }
    let table = table.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    let dropped_missing = (before_required - table.height()).saturating_sub(dropped_unparseable);

    info!(
        "Cleaning kept {} of {} rows ({} non-positive {}, {} unparseable, {} missing required)",
        table.height(),
        input_rows,
        dropped_non_positive,
        filter.target,
        dropped_unparseable,
        dropped_missing
    );

    Ok(CleanOutcome {
        table,
        input_rows,
        dropped_non_positive,
        dropped_unparseable,
        dropped_missing,
    })
}
