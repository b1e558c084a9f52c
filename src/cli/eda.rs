//! Exploratory analysis branch: load, summarize, analyze and chart

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{info, warn};

use super::args::Cli;
use crate::analysis::{
    correlation_matrix, detect_outliers, distribution_stats, grouped_loss_ratio, loss_ratio, temporal_trend,
    vehicle_claims,
};
use crate::pipeline::{
    apply_column_types, impute_numeric_means, infer_date_columns, load_dataset, summarize, ColumnKind, ColumnTypes,
    Imputation, LoadOptions,
};
use crate::report::{
    display_data_summary, display_distributions, display_imputation, display_loss_ratios, display_outliers,
    display_trend, display_vehicle_claims, export_eda_report, EdaExportParams, EdaResults, DEFAULT_TOP_ROWS,
};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_chart, print_completion, print_config, print_info,
    print_step_header, print_step_time, print_success, print_warning,
};
use crate::viz::{render, ChartRequest};

pub const CLAIMS_COLUMN: &str = "TotalClaims";
pub const PREMIUM_COLUMN: &str = "TotalPremium";
pub const MAKE_COLUMN: &str = "Make";
pub const MODEL_COLUMN: &str = "Model";

/// Columns whose distributions, outliers and correlations are analyzed
pub const ANALYSIS_COLUMNS: [&str; 3] = ["TotalPremium", "TotalClaims", "CustomValueEstimate"];

/// Run the exploratory branch with the given command-line settings
pub fn run_eda(cli: &Cli) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &cli.input,
        &[
            ("Group by", cli.group_by.clone()),
            ("Date column", cli.date_column.clone()),
            ("Outlier method", cli.outlier_method.to_string()),
            (
                "Charts",
                if cli.no_charts {
                    "off".to_string()
                } else {
                    cli.charts_dir.display().to_string()
                },
            ),
            (
                "Report",
                cli.report
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ],
    );
    let analysis_columns: Vec<String> = ANALYSIS_COLUMNS.iter().map(|c| c.to_string()).collect();

    // Step 1: Load and prepare
    print_step_header(1, "Load Data");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let options = LoadOptions {
        separator: cli.separator,
        infer_schema_length: cli.infer_schema_length,
        text_columns: vec![CLAIMS_COLUMN.to_string(), PREMIUM_COLUMN.to_string()],
    };
    let df = load_dataset(&cli.input, &options)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    let (df, date_columns) = infer_date_columns(df)?;
    let declared = declared_types(&df, &cli.date_column);
    let df = apply_column_types(df, &declared)?;
    let Imputation {
        table: df,
        imputed,
        skipped,
    } = impute_numeric_means(df)?;
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows x {} columns", df.height(), df.width()),
    );

    let summary = summarize(&df)?;
    info!(
        "Data summary: shape ({}, {}), {} column(s) with missing values",
        summary.rows,
        summary.columns,
        summary.missing_values.iter().filter(|(_, n)| *n > 0).count()
    );
    display_data_summary(&summary);
    display_imputation(&imputed, &skipped);
    print_step_time(step_start.elapsed());

    // Step 2: Loss ratios
    print_step_header(2, "Loss Ratio");
    let step_start = Instant::now();
    let overall = loss_ratio(&df, CLAIMS_COLUMN, PREMIUM_COLUMN)?;
    info!("Overall loss ratio: {:.2}", overall.ratio);
    let by_group = grouped_loss_ratio(&df, std::slice::from_ref(&cli.group_by), CLAIMS_COLUMN, PREMIUM_COLUMN)?;
    info!("Loss ratio computed for {} {} group(s)", by_group.len(), cli.group_by);
    display_loss_ratios(&overall, &by_group, &cli.group_by);
    print_step_time(step_start.elapsed());

    // Step 3: Distributions and outliers
    print_step_header(3, "Distributions and Outliers");
    let step_start = Instant::now();
    let distributions = distribution_stats(&df, &analysis_columns)?;
    display_distributions(&distributions);
    let outliers = detect_outliers(&df, &analysis_columns, cli.outlier_method)?;
    for column in &outliers {
        info!("{}: {} outlier row(s)", column.column, column.rows.len());
    }
    display_outliers(&outliers, cli.outlier_method);
    let correlation = correlation_matrix(&df, &analysis_columns)?;
    print_step_time(step_start.elapsed());

    // Step 4: Temporal trend and vehicles
    print_step_header(4, "Trends and Vehicles");
    let step_start = Instant::now();
    let trend = temporal_trend(&df, &cli.date_column, CLAIMS_COLUMN)?;
    info!("Monthly trend covers {} month(s)", trend.len());
    display_trend(&trend, CLAIMS_COLUMN);
    let vehicles = vehicle_claims(&df, MAKE_COLUMN, MODEL_COLUMN, CLAIMS_COLUMN, PREMIUM_COLUMN)?;
    info!("Vehicle rollup covers {} make/model pair(s)", vehicles.len());
    display_vehicle_claims(&vehicles, DEFAULT_TOP_ROWS);
    print_step_time(step_start.elapsed());

    // Step 5: Charts
    print_step_header(5, "Charts");
    if cli.no_charts {
        print_info("Chart rendering disabled (--no-charts)");
    } else {
        let step_start = Instant::now();
        let written = render_charts(&df, &chart_requests(cli, &analysis_columns), &cli.charts_dir);
        print_success(&format!("{} chart(s) written to {}", written.len(), cli.charts_dir.display()));
        print_step_time(step_start.elapsed());
    }

    // Step 6: Report
    if let Some(report_path) = &cli.report {
        print_step_header(6, "Save Report");
        let results = EdaResults {
            summary,
            imputed,
            date_columns,
            overall,
            by_group,
            distributions,
            outliers,
            trend,
            vehicles,
            correlation: Some(correlation),
        };
        let input_file = cli.input.display().to_string();
        export_eda_report(
            &results,
            &EdaExportParams {
                input_file: &input_file,
                group_by: &cli.group_by,
                date_column: &cli.date_column,
                outlier_method: cli.outlier_method,
            },
            report_path,
        )?;
        info!("Analysis report written to {}", report_path.display());
        print_success(&format!("Saved report to {}", report_path.display()));
    }

    print_completion("Claimlens analysis");
    Ok(())
}

/// Declared kinds for the columns the analysis relies on, where present
fn declared_types(df: &DataFrame, date_column: &str) -> ColumnTypes {
    let names = df.get_column_names();
    let present = |column: &str| names.iter().any(|n| n.as_str() == column);

    let mut types = ColumnTypes::new();
    if present(date_column) {
        types = types.with(date_column, ColumnKind::Date);
    }
    for column in [CLAIMS_COLUMN, PREMIUM_COLUMN] {
        if present(column) {
            types = types.with(column, ColumnKind::Number);
        }
    }
    types
}

/// Charts of the exploratory branch, in rendering order
pub fn chart_requests(cli: &Cli, analysis_columns: &[String]) -> Vec<ChartRequest> {
    let mut requests = vec![ChartRequest::LossRatioByCategory {
        category: cli.group_by.clone(),
        claims: CLAIMS_COLUMN.to_string(),
        premium: PREMIUM_COLUMN.to_string(),
    }];
    requests.extend(
        analysis_columns
            .iter()
            .map(|column| ChartRequest::Distribution { column: column.clone() }),
    );
    requests.push(ChartRequest::TemporalTrend {
        date_column: cli.date_column.clone(),
        value_column: CLAIMS_COLUMN.to_string(),
    });
    requests.push(ChartRequest::CorrelationMatrix {
        columns: analysis_columns.to_vec(),
    });
    for column in analysis_columns {
        requests.push(ChartRequest::Boxplot {
            column: column.clone(),
            group_by: None,
        });
        requests.push(ChartRequest::Boxplot {
            column: column.clone(),
            group_by: Some(cli.group_by.clone()),
        });
    }
    requests
}

/// Render every request; a failed chart is reported and skipped
fn render_charts(df: &DataFrame, requests: &[ChartRequest], dir: &std::path::Path) -> Vec<PathBuf> {
    let mut written = Vec::with_capacity(requests.len());
    for request in requests {
        match render(df, request, dir) {
            Ok(path) => {
                print_chart(&path);
                written.push(path);
            }
            Err(e) => {
                warn!("{}", e);
                print_warning(&e.to_string());
            }
        }
    }
    written
}
