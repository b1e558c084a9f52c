//! Typed column extraction shared by every stage
//!
//! Stages read polars columns into plain vectors through these helpers so
//! that type checks and error messages are uniform.

use chrono::{Duration, NaiveDate};
use polars::prelude::*;

use crate::error::DataError;

/// Formats tried, in order, when a text value is read as a date-time.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Formats tried, in order, when a text value is read as a plain date.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Look up a column, mapping absence to [`DataError::MissingColumn`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, DataError> {
    df.column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))
}

/// Read a numeric column as `f64`, preserving missing cells.
///
/// Fails with [`DataError::WrongType`] for non-numeric columns; text columns
/// must go through [`parse_numeric_text`] explicitly.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DataError> {
    let column = require_column(df, name)?;
    if !column.dtype().is_primitive_numeric() {
        return Err(DataError::WrongType {
            column: name.to_string(),
            expected: "numeric",
            actual: column.dtype().to_string(),
        });
    }
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Per-row missing flags of a column.
pub fn null_mask(df: &DataFrame, name: &str) -> Result<Vec<bool>, DataError> {
    let column = require_column(df, name)?;
    Ok(column
        .as_materialized_series()
        .rechunk()
        .iter()
        .map(|value| value.is_null())
        .collect())
}

/// Read any column as text. Numbers, booleans and dates are rendered with
/// polars' own string cast.
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, DataError> {
    let column = require_column(df, name)?;
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Read a `Date` or `Datetime` column as calendar dates.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>, DataError> {
    let column = require_column(df, name)?;
    if !matches!(column.dtype(), DataType::Date | DataType::Datetime(_, _)) {
        return Err(DataError::WrongType {
            column: name.to_string(),
            expected: "date",
            actual: column.dtype().to_string(),
        });
    }
    let days = column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|d| d.and_then(date_from_days))
        .collect())
}

/// Build a polars `Date` column from calendar dates.
pub fn date_column(name: &str, values: &[Option<NaiveDate>]) -> PolarsResult<Column> {
    let days: Vec<Option<i32>> = values.iter().map(|d| d.map(days_since_epoch)).collect();
    Column::new(name.into(), days).cast(&DataType::Date)
}

/// Parse a text cell as a number. Surrounding whitespace is ignored.
pub fn parse_numeric_text(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a text cell as a date, accepting date-time values (time is dropped).
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        })
}

/// `NaiveDate::default()` is 1970-01-01.
fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(NaiveDate::default()).num_days() as i32
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(Duration::days(days as i64))
}
