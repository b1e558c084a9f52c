//! Calendar-month rollup of one value column

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use polars::prelude::DataFrame;
use serde::Serialize;

use crate::error::DataError;
use crate::pipeline::columns::{date_values, numeric_values};

/// Aggregates of one calendar month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAggregate {
    /// First day of the month
    pub month: NaiveDate,
    /// `None` when every value in the month is missing
    pub mean: Option<f64>,
    pub sum: f64,
    /// Non-missing values in the month
    pub count: usize,
}

impl MonthlyAggregate {
    pub fn label(&self) -> String {
        self.month.format("%Y-%m").to_string()
    }
}

/// Mean, sum and count of `value_column` per calendar month of `date_column`.
///
/// Months are ascending. Only months holding at least one dated row appear;
/// rows with a missing date are left out.
pub fn temporal_trend(
    df: &DataFrame,
    date_column: &str,
    value_column: &str,
) -> Result<Vec<MonthlyAggregate>, DataError> {
    let dates = date_values(df, date_column)?;
    let values = numeric_values(df, value_column)?;

    let mut months: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, value) in dates.iter().zip(values.iter()) {
        let Some(date) = date else {
            continue;
        };
        let Some(month) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) else {
            continue;
        };
        let entry = months.entry(month).or_insert((0.0, 0));
        if let Some(v) = (*value).filter(|v| !v.is_nan()) {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    Ok(months
        .into_iter()
        .map(|(month, (sum, count))| MonthlyAggregate {
            month,
            mean: (count > 0).then(|| sum / count as f64),
            sum,
            count,
        })
        .collect())
}
