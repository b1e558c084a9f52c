//! Bar charts: loss ratio per category and attribution ranking

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use polars::prelude::DataFrame;

use super::{
    category_label, chart_path, data_error, empty_data, log_written, render_error, ChartKind, CAPTION_FONT,
    CHART_SIZE, LABEL_FONT,
};
use crate::analysis::loss_ratio_by_category;
use crate::error::VisualizationError;
use crate::models::Attribution;

/// Most features shown in the attribution chart
const MAX_ATTRIBUTION_BARS: usize = 20;

/// Loss ratio of each level of `category`, highest first.
pub fn plot_loss_ratio_by_category(
    df: &DataFrame,
    category: &str,
    claims: &str,
    premium: &str,
    dir: &Path,
) -> Result<PathBuf, VisualizationError> {
    let kind = ChartKind::Bar;
    let groups = loss_ratio_by_category(df, category, claims, premium).map_err(|e| data_error(kind, e))?;
    let bars: Vec<(String, f64)> = groups
        .into_iter()
        .filter(|g| g.ratio.is_finite())
        .map(|g| (g.label(), g.ratio))
        .collect();
    if bars.is_empty() {
        return Err(empty_data(kind, category));
    }

    let path = chart_path(dir, kind, &format!("loss_ratio_by_{}", category))?;
    draw_vertical_bars(&path, &format!("Loss Ratio by {}", category), category, "Loss Ratio", &bars)
        .map_err(|e| render_error(kind, e))?;
    log_written(kind, &path);
    Ok(path)
}

/// Mean absolute attribution per feature, largest at the top.
pub fn plot_attribution(attribution: &Attribution, dir: &Path) -> Result<PathBuf, VisualizationError> {
    let kind = ChartKind::Bar;
    let mut ranking = attribution.global_ranking();
    ranking.truncate(MAX_ATTRIBUTION_BARS);
    if ranking.is_empty() || attribution.values.is_empty() {
        return Err(empty_data(kind, "attribution"));
    }

    let path = chart_path(dir, kind, "attribution_ranking")?;
    draw_ranking(&path, &ranking.iter().map(|r| (r.feature.clone(), r.mean_abs)).collect::<Vec<_>>())
        .map_err(|e| render_error(kind, e))?;
    log_written(kind, &path);
    Ok(path)
}

fn draw_vertical_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    bars: &[(String, f64)],
) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();
    let y_max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let y_min = bars.iter().map(|(_, v)| *v).fold(0.0, f64::min);
    let headroom = ((y_max - y_min) * 0.1).max(f64::EPSILON);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT)
        .margin(16)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(bars.len() as f64 - 0.5), y_min..(y_max + headroom))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|x: &f64| category_label(&labels, *x))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *value)], BLUE.mix(0.7).filled())
    }))?;

    root.present()?;
    Ok(())
}

fn draw_ranking(path: &Path, ranking: &[(String, f64)]) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let n = ranking.len();
    // Rank 0 is drawn at the top
    let labels: Vec<String> = ranking.iter().rev().map(|(name, _)| name.clone()).collect();
    let x_max = ranking.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(f64::EPSILON) * 1.1;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Feature Attribution (mean |value|)", CAPTION_FONT)
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(220)
        .build_cartesian_2d(0f64..x_max, -0.5f64..(n as f64 - 0.5))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|y: &f64| category_label(&labels, *y))
        .x_desc("Mean absolute attribution")
        .label_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(ranking.iter().enumerate().map(|(rank, (_, value))| {
        let y = (n - 1 - rank) as f64;
        Rectangle::new([(0.0, y - 0.35), (*value, y + 0.35)], RED.mix(0.7).filled())
    }))?;

    root.present()?;
    Ok(())
}
