//! Terminal tables for analysis and modeling results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::analysis::{
    ColumnOutliers, DistributionStats, GroupLossRatio, LossRatio, MonthlyAggregate, OutlierMethod, VehicleClaims,
};
use crate::models::{FeatureImportance, ModelOutcome};
use crate::pipeline::{CleanOutcome, DataSummary, ImputedColumn};

/// Rows shown for long rollups
pub const DEFAULT_TOP_ROWS: usize = 15;

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn number(value: f64) -> Cell {
    Cell::new(format!("{:.2}", value)).set_alignment(CellAlignment::Right)
}

fn optional(value: Option<f64>) -> Cell {
    match value {
        Some(v) => number(v),
        None => Cell::new("-").fg(Color::DarkGrey).set_alignment(CellAlignment::Right),
    }
}

fn ratio_cell(ratio: f64) -> Cell {
    if !ratio.is_finite() {
        return Cell::new(format!("{}", ratio)).fg(Color::DarkGrey);
    }
    let color = if ratio > 1.0 {
        Color::Red
    } else if ratio > 0.7 {
        Color::Yellow
    } else {
        Color::Green
    };
    Cell::new(format!("{:.4}", ratio))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

/// Shape, dtypes and missing counts, followed by numeric describe.
pub fn display_data_summary(summary: &DataSummary) {
    print_section("📋", "DATA SUMMARY");
    println!(
        "      Rows: {}    Columns: {}",
        style(summary.rows).cyan().bold(),
        style(summary.columns).cyan().bold()
    );
    println!();

    let mut table = new_table(&["Column", "Type", "Missing"]);
    for ((name, dtype), (_, missing)) in summary.dtypes.iter().zip(&summary.missing_values) {
        let missing_cell = Cell::new(missing).set_alignment(CellAlignment::Right);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(dtype).fg(Color::DarkGrey),
            if *missing > 0 {
                missing_cell.fg(Color::Yellow)
            } else {
                missing_cell
            },
        ]);
    }
    print_indented(&table);

    if !summary.numeric.is_empty() {
        println!();
        let mut table = new_table(&["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"]);
        for stats in &summary.numeric {
            table.add_row(vec![
                Cell::new(&stats.column),
                Cell::new(stats.count).set_alignment(CellAlignment::Right),
                optional(stats.mean),
                optional(stats.std),
                optional(stats.min),
                optional(stats.q25),
                optional(stats.median),
                optional(stats.q75),
                optional(stats.max),
            ]);
        }
        print_indented(&table);
    }

    if !summary.categorical.is_empty() {
        println!();
        let mut table = new_table(&["Column", "Distinct", "Most frequent"]);
        for stats in &summary.categorical {
            let top = stats
                .top_levels
                .iter()
                .map(|(level, count)| format!("{} ({})", level, count))
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(vec![
                Cell::new(&stats.column),
                Cell::new(stats.distinct).set_alignment(CellAlignment::Right),
                Cell::new(top),
            ]);
        }
        print_indented(&table);
    }
}

/// Columns whose gaps were filled with the mean
pub fn display_imputation(imputed: &[ImputedColumn], skipped: &[String]) {
    if imputed.is_empty() && skipped.is_empty() {
        return;
    }
    print_section("🩹", "MEAN IMPUTATION");
    let mut table = new_table(&["Column", "Mean", "Filled"]);
    for column in imputed {
        table.add_row(vec![
            Cell::new(&column.column),
            number(column.mean),
            Cell::new(column.filled).set_alignment(CellAlignment::Right),
        ]);
    }
    for column in skipped {
        table.add_row(vec![
            Cell::new(column),
            Cell::new("no observed values").fg(Color::Yellow),
            Cell::new(0).set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
}

/// Rows dropped by each cleaning pass
pub fn display_clean_outcome(outcome: &CleanOutcome) {
    print_section("🧹", "CLEANING");
    let mut table = new_table(&["Pass", "Rows"]);
    table.add_row(vec![Cell::new("Input rows"), Cell::new(outcome.input_rows)]);
    let drops = [
        ("Dropped (non-positive target)", outcome.dropped_non_positive),
        ("Dropped (unparseable number)", outcome.dropped_unparseable),
        ("Dropped (missing required)", outcome.dropped_missing),
    ];
    for (label, count) in drops {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(count).fg(if count == 0 { Color::White } else { Color::Red }),
        ]);
    }
    table.add_row(vec![
        Cell::new("Retained"),
        Cell::new(outcome.table.height())
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    print_indented(&table);
}

/// Portfolio loss ratio and the per-group breakdown
pub fn display_loss_ratios(overall: &LossRatio, groups: &[GroupLossRatio], group_by: &str) {
    print_section("💰", "LOSS RATIO");
    println!(
        "      Overall: {}  (claims {:.2} / premium {:.2})",
        style(format!("{:.4}", overall.ratio)).cyan().bold(),
        overall.total_claims,
        overall.total_premium
    );
    if groups.is_empty() {
        return;
    }
    println!();

    let mut table = new_table(&[group_by, "Rows", "Claims", "Premium", "Loss Ratio"]);
    for group in groups {
        table.add_row(vec![
            Cell::new(group.label()),
            Cell::new(group.rows).set_alignment(CellAlignment::Right),
            number(group.total_claims),
            number(group.total_premium),
            ratio_cell(group.ratio),
        ]);
    }
    print_indented(&table);
}

/// Distribution moments per column
pub fn display_distributions(stats: &[DistributionStats]) {
    print_section("📈", "DISTRIBUTIONS");
    let mut table = new_table(&["Column", "Count", "Mean", "Std", "Skewness", "Kurtosis"]);
    for s in stats {
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new(s.count).set_alignment(CellAlignment::Right),
            optional(s.mean),
            optional(s.std),
            optional(s.skewness),
            optional(s.kurtosis),
        ]);
    }
    print_indented(&table);
}

/// Outlier fences and flagged row counts per column
pub fn display_outliers(outliers: &[ColumnOutliers], method: OutlierMethod) {
    print_section("🎯", &format!("OUTLIERS ({})", method));
    let mut table = new_table(&["Column", "Lower", "Upper", "Flagged"]);
    for column in outliers {
        table.add_row(vec![
            Cell::new(&column.column),
            optional(column.lower_bound),
            optional(column.upper_bound),
            Cell::new(column.rows.len())
                .fg(if column.rows.is_empty() { Color::White } else { Color::Yellow })
                .set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
}

/// Monthly aggregates of one value column
pub fn display_trend(months: &[MonthlyAggregate], value_column: &str) {
    print_section("🗓️", &format!("MONTHLY TREND ({})", value_column));
    if months.is_empty() {
        println!("      {}", style("No dated rows").dim());
        return;
    }
    let mut table = new_table(&["Month", "Count", "Sum", "Mean"]);
    for month in months {
        table.add_row(vec![
            Cell::new(month.label()),
            Cell::new(month.count).set_alignment(CellAlignment::Right),
            number(month.sum),
            optional(month.mean),
        ]);
    }
    print_indented(&table);
}

/// Vehicle rollup, largest claim totals first
pub fn display_vehicle_claims(vehicles: &[VehicleClaims], top: usize) {
    print_section("🚗", "CLAIMS BY VEHICLE");
    let mut ranked: Vec<&VehicleClaims> = vehicles.iter().collect();
    ranked.sort_by(|a, b| b.claims_sum.total_cmp(&a.claims_sum));

    let mut table = new_table(&["Make", "Model", "Claims", "Mean", "Count", "Premium"]);
    for vehicle in ranked.iter().take(top) {
        table.add_row(vec![
            Cell::new(&vehicle.make),
            Cell::new(&vehicle.model),
            number(vehicle.claims_sum),
            optional(vehicle.claims_mean),
            Cell::new(vehicle.claims_count).set_alignment(CellAlignment::Right),
            number(vehicle.premium_sum),
        ]);
    }
    print_indented(&table);
    if ranked.len() > top {
        println!(
            "      {}",
            style(format!("... {} more vehicle(s)", ranked.len() - top)).dim()
        );
    }
}

/// Test-partition scores per model; failed models show their error
pub fn display_model_scoreboard(outcomes: &[ModelOutcome]) {
    print_section("🏁", "MODEL EVALUATION");
    let mut table = new_table(&["Model", "RMSE", "R²", "MAE", "Test rows", "Fit (s)"]);
    for outcome in outcomes {
        match &outcome.result {
            Ok(trained) => {
                let m = &trained.metrics;
                table.add_row(vec![
                    Cell::new(&outcome.name).add_attribute(Attribute::Bold),
                    number(m.rmse),
                    Cell::new(format!("{:.4}", m.r2)).set_alignment(CellAlignment::Right),
                    number(m.mae),
                    Cell::new(m.n).set_alignment(CellAlignment::Right),
                    number(trained.fit_seconds),
                ]);
            }
            Err(e) => {
                table.add_row(vec![
                    Cell::new(&outcome.name).add_attribute(Attribute::Bold),
                    Cell::new(format!("failed: {}", e)).fg(Color::Red),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
        }
    }
    print_indented(&table);
}

/// Mean absolute attribution per feature
pub fn display_attribution(model: &str, ranking: &[FeatureImportance], top: usize) {
    print_section("🔍", &format!("FEATURE ATTRIBUTION ({})", model));
    let mut table = new_table(&["Rank", "Feature", "Mean |SHAP|"]);
    for (rank, importance) in ranking.iter().take(top).enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&importance.feature),
            Cell::new(format!("{:.4}", importance.mean_abs)).set_alignment(CellAlignment::Right),
        ]);
    }
    print_indented(&table);
}
