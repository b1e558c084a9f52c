//! Pearson correlation matrix over numeric columns

use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::Serialize;

use super::stats::pearson;
use crate::error::DataError;
use crate::pipeline::columns::numeric_values;

/// Symmetric correlation matrix; `None` where a pair has no defined correlation
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pairwise-complete Pearson correlation between every pair of columns.
///
/// The diagonal is 1.0 for any column with spread, `None` for a constant
/// column.
pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix, DataError> {
    let data: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|name| {
            numeric_values(df, name)
                .map(|values| values.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
        })
        .collect::<Result<_, _>>()?;

    let n = columns.len();
    // Upper triangle including the diagonal
    let pairs: Vec<(usize, usize)> = (0..n).flat_map(|i| (i..n).map(move |j| (i, j))).collect();
    let computed: Vec<(usize, usize, Option<f64>)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let r = pearson(&data[i], &data[j]).map(|r| if i == j { 1.0 } else { r.clamp(-1.0, 1.0) });
            (i, j, r)
        })
        .collect();

    let mut values = vec![vec![None; n]; n];
    for (i, j, r) in computed {
        values[i][j] = r;
        values[j][i] = r;
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}
