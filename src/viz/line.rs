//! Monthly trend line

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use polars::prelude::DataFrame;

use super::{
    category_label, chart_path, data_error, empty_data, log_written, padded_range, render_error, ChartKind,
    CAPTION_FONT, CHART_SIZE, LABEL_FONT,
};
use crate::analysis::temporal_trend;
use crate::error::VisualizationError;

/// Monthly mean of `value_column` over `date_column`.
pub fn plot_temporal_trend(
    df: &DataFrame,
    date_column: &str,
    value_column: &str,
    dir: &Path,
) -> Result<PathBuf, VisualizationError> {
    let kind = ChartKind::Line;
    let months = temporal_trend(df, date_column, value_column).map_err(|e| data_error(kind, e))?;
    let points: Vec<(String, f64)> = months
        .iter()
        .filter_map(|m| m.mean.map(|mean| (m.label(), mean)))
        .collect();
    if points.is_empty() {
        return Err(empty_data(kind, value_column));
    }

    let path = chart_path(dir, kind, &format!("trend_{}_by_month", value_column))?;
    draw(&path, value_column, &points).map_err(|e| render_error(kind, e))?;
    log_written(kind, &path);
    Ok(path)
}

fn draw(path: &Path, value_column: &str, points: &[(String, f64)]) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let labels: Vec<String> = points.iter().map(|(label, _)| label.clone()).collect();
    let y_lo = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let y_hi = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let (y_lo, y_hi) = padded_range(y_lo, y_hi);
    let n = points.len();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Monthly mean {}", value_column), CAPTION_FONT)
        .margin(16)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_labels(n.min(24))
        .x_label_formatter(&|x: &f64| category_label(&labels, *x))
        .x_desc("Month")
        .y_desc(format!("Mean {}", value_column))
        .label_style(LABEL_FONT)
        .draw()?;

    let series: Vec<(f64, f64)> = points.iter().enumerate().map(|(i, (_, v))| (i as f64, *v)).collect();
    chart.draw_series(LineSeries::new(series.clone(), &BLUE))?;
    chart.draw_series(series.into_iter().map(|point| Circle::new(point, 3, BLUE.filled())))?;

    root.present()?;
    Ok(())
}
