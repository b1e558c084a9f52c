//! JSON export of an exploratory analysis run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::analysis::{
    ColumnOutliers, CorrelationMatrix, DistributionStats, GroupLossRatio, LossRatio, MonthlyAggregate,
    OutlierMethod, VehicleClaims,
};
use crate::pipeline::{DataSummary, ImputedColumn};

/// Metadata about the analysis run
#[derive(Serialize)]
pub struct EdaMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    /// Claimlens version
    pub claimlens_version: String,
    /// Input file path
    pub input_file: String,
    /// Column loss ratios were grouped by
    pub group_by: String,
    /// Column monthly trends were keyed on
    pub date_column: String,
    /// Outlier rule
    pub outlier_method: OutlierMethod,
}

/// Every result of the exploratory branch
#[derive(Debug, Clone, Serialize)]
pub struct EdaResults {
    pub summary: DataSummary,
    pub imputed: Vec<ImputedColumn>,
    /// Text columns converted to dates on load
    pub date_columns: Vec<String>,
    pub overall: LossRatio,
    pub by_group: Vec<GroupLossRatio>,
    pub distributions: Vec<DistributionStats>,
    pub outliers: Vec<ColumnOutliers>,
    pub trend: Vec<MonthlyAggregate>,
    pub vehicles: Vec<VehicleClaims>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationMatrix>,
}

/// Complete export with metadata
#[derive(Serialize)]
pub struct EdaExport<'a> {
    pub metadata: EdaMetadata,
    #[serde(flatten)]
    pub results: &'a EdaResults,
}

/// Parameters recorded in the export metadata
pub struct EdaExportParams<'a> {
    pub input_file: &'a str,
    pub group_by: &'a str,
    pub date_column: &'a str,
    pub outlier_method: OutlierMethod,
}

/// Export analysis results to a JSON file
///
/// # Arguments
/// * `results` - Everything the exploratory branch computed
/// * `params` - Run parameters for metadata
/// * `output_path` - Path to write the JSON file
pub fn export_eda_report(results: &EdaResults, params: &EdaExportParams, output_path: &Path) -> Result<()> {
    let export = EdaExport {
        metadata: EdaMetadata {
            timestamp: Utc::now().to_rfc3339(),
            claimlens_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.to_string(),
            group_by: params.group_by.to_string(),
            date_column: params.date_column.to_string(),
            outlier_method: params.outlier_method,
        },
        results,
    };

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize analysis results to JSON")?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write analysis report to {}", output_path.display()))?;

    Ok(())
}
