//! Loss ratio: total claims over total premium
//!
//! Missing cells are left out of both sums. A zero premium total yields an
//! infinite (or NaN) ratio rather than an error so that one empty group does
//! not hide the others.

use serde::Serialize;

use super::{group_rows, sum_at};
use crate::error::DataError;
use crate::pipeline::columns::numeric_values;
use polars::prelude::DataFrame;

/// Overall loss ratio
#[derive(Debug, Clone, Serialize)]
pub struct LossRatio {
    pub total_claims: f64,
    pub total_premium: f64,
    pub ratio: f64,
}

/// Loss ratio of one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupLossRatio {
    /// One value per grouping column
    pub key: Vec<String>,
    pub rows: usize,
    pub total_claims: f64,
    pub total_premium: f64,
    pub ratio: f64,
}

impl GroupLossRatio {
    /// Key values joined for display
    pub fn label(&self) -> String {
        self.key.join(" / ")
    }
}

/// Loss ratio over the whole table.
pub fn loss_ratio(df: &DataFrame, claims: &str, premium: &str) -> Result<LossRatio, DataError> {
    let claim_values = numeric_values(df, claims)?;
    let premium_values = numeric_values(df, premium)?;
    let rows: Vec<usize> = (0..df.height()).collect();

    let total_claims = sum_at(&claim_values, &rows);
    let total_premium = sum_at(&premium_values, &rows);
    Ok(LossRatio {
        total_claims,
        total_premium,
        ratio: total_claims / total_premium,
    })
}

/// Loss ratio per group, groups in order of first appearance.
pub fn grouped_loss_ratio(
    df: &DataFrame,
    group_by: &[String],
    claims: &str,
    premium: &str,
) -> Result<Vec<GroupLossRatio>, DataError> {
    let claim_values = numeric_values(df, claims)?;
    let premium_values = numeric_values(df, premium)?;

    Ok(group_rows(df, group_by)?
        .into_iter()
        .map(|(key, rows)| {
            let total_claims = sum_at(&claim_values, &rows);
            let total_premium = sum_at(&premium_values, &rows);
            GroupLossRatio {
                key,
                rows: rows.len(),
                total_claims,
                total_premium,
                ratio: total_claims / total_premium,
            }
        })
        .collect())
}

/// Loss ratio per level of one column, highest ratio first.
///
/// NaN ratios (zero claims over zero premium) sort last.
pub fn loss_ratio_by_category(
    df: &DataFrame,
    category: &str,
    claims: &str,
    premium: &str,
) -> Result<Vec<GroupLossRatio>, DataError> {
    let mut groups = grouped_loss_ratio(df, &[category.to_string()], claims, premium)?;
    groups.sort_by(|a, b| match (a.ratio.is_nan(), b.ratio.is_nan()) {
        (false, false) => b.ratio.total_cmp(&a.ratio),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    Ok(groups)
}
