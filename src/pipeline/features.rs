//! Feature matrix construction for the claim-severity models
//!
//! Numeric features are copied through as `f64`; categorical features are
//! one-hot encoded against the levels observed in the current table, with the
//! first sorted level dropped as the reference.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::columns::{numeric_values, text_values};
use crate::error::DataError;

/// Column selection for the modeling branch
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub target: String,
}

impl Default for FeatureSpec {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            numeric: owned(&["Cubiccapacity", "Kilowatts", "CapitalOutstanding", "SumInsured"]),
            categorical: owned(&["NewVehicle", "Gender", "Province", "VehicleType"]),
            target: "TotalClaims".to_string(),
        }
    }
}

/// Observed levels of one categorical column
#[derive(Debug, Clone, Serialize)]
pub struct CategoryLevels {
    pub column: String,
    /// Reference level with no indicator column
    pub dropped: Option<String>,
    /// Levels that received an indicator column, in column order
    pub encoded: Vec<String>,
}

/// Dense row-major feature matrix
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { names, rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Copy the given rows, in the given order
    pub fn select(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            names: self.names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Values of one feature across all rows
    pub fn column(&self, feature: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[feature]).collect()
    }
}

/// Features, target and the encoding used to build them
#[derive(Debug, Clone)]
pub struct ModelingData {
    pub features: FeatureMatrix,
    pub target: Vec<f64>,
    pub categories: Vec<CategoryLevels>,
    /// Rows dropped for a missing feature or target
    pub dropped_incomplete: usize,
}

/// Build the feature matrix and target vector.
///
/// Rows missing any selected feature or the target are dropped before
/// encoding, so category levels reflect complete rows only. Numeric features
/// must already be numeric columns.
pub fn build_features(df: &DataFrame, spec: &FeatureSpec) -> Result<ModelingData, DataError> {
    let target = numeric_values(df, &spec.target)?;
    let numeric: Vec<Vec<Option<f64>>> = spec
        .numeric
        .iter()
        .map(|name| numeric_values(df, name))
        .collect::<Result<_, _>>()?;
    let categorical: Vec<Vec<Option<String>>> = spec
        .categorical
        .iter()
        .map(|name| text_values(df, name))
        .collect::<Result<_, _>>()?;

    let complete: Vec<usize> = (0..df.height())
        .filter(|&i| {
            target[i].is_some_and(|v| !v.is_nan())
                && numeric.iter().all(|col| col[i].is_some_and(|v| !v.is_nan()))
                && categorical.iter().all(|col| col[i].is_some())
        })
        .collect();
    let dropped_incomplete = df.height() - complete.len();
    if complete.is_empty() {
        return Err(DataError::Empty("build features from"));
    }

    let mut names: Vec<String> = spec.numeric.clone();
    let mut categories = Vec::with_capacity(spec.categorical.len());
    for (name, values) in spec.categorical.iter().zip(categorical.iter()) {
        let levels = encode_levels(name, complete.iter().filter_map(|&i| values[i].as_deref()));
        names.extend(levels.encoded.iter().map(|level| format!("{}_{}", name, level)));
        categories.push(levels);
    }

    let rows: Vec<Vec<f64>> = complete
        .iter()
        .map(|&i| {
            let mut row = Vec::with_capacity(names.len());
            row.extend(numeric.iter().map(|col| col[i].unwrap_or(f64::NAN)));
            for (values, levels) in categorical.iter().zip(categories.iter()) {
                let value = values[i].as_deref();
                row.extend(
                    levels
                        .encoded
                        .iter()
                        .map(|level| if value == Some(level.as_str()) { 1.0 } else { 0.0 }),
                );
            }
            row
        })
        .collect();

    for levels in &categories {
        debug!(
            column = %levels.column,
            dropped = ?levels.dropped,
            encoded = levels.encoded.len(),
            "encoded categorical column"
        );
    }
    info!(
        "Built feature matrix: {} rows x {} features ({} incomplete rows dropped)",
        rows.len(),
        names.len(),
        dropped_incomplete
    );

    Ok(ModelingData {
        features: FeatureMatrix::new(names, rows),
        target: complete.iter().filter_map(|&i| target[i]).collect(),
        categories,
        dropped_incomplete,
    })
}

fn encode_levels<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> CategoryLevels {
    let mut levels: Vec<String> = values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let dropped = if levels.is_empty() {
        None
    } else {
        Some(levels.remove(0))
    };
    CategoryLevels {
        column: column.to_string(),
        dropped,
        encoded: levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_levels_drops_first_sorted_level() {
        let levels = encode_levels("Gender", ["Male", "Female", "Male", "Not specified"].into_iter());
        assert_eq!(levels.dropped.as_deref(), Some("Female"));
        assert_eq!(levels.encoded, vec!["Male", "Not specified"]);
    }

    #[test]
    fn test_single_level_column_has_no_indicators() {
        let levels = encode_levels("NewVehicle", ["More than 6 months"; 3].into_iter());
        assert_eq!(levels.dropped.as_deref(), Some("More than 6 months"));
        assert!(levels.encoded.is_empty());
    }
}
