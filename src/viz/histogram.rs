//! Histogram of one numeric column

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use polars::prelude::DataFrame;

use super::{chart_path, data_error, empty_data, log_written, render_error, ChartKind, CAPTION_FONT, CHART_SIZE, LABEL_FONT};
use crate::analysis::stats::{quantile_sorted, sorted_copy};
use crate::error::VisualizationError;
use crate::pipeline::columns::numeric_values;

const MAX_BINS: usize = 100;

/// Histogram with an automatic bin count.
pub fn plot_distribution(df: &DataFrame, column: &str, dir: &Path) -> Result<PathBuf, VisualizationError> {
    let kind = ChartKind::Histogram;
    let observed: Vec<f64> = numeric_values(df, column)
        .map_err(|e| data_error(kind, e))?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if observed.is_empty() {
        return Err(empty_data(kind, column));
    }

    let sorted = sorted_copy(&observed);
    let (lo, hi, counts) = bin_counts(&sorted);

    let path = chart_path(dir, kind, &format!("distribution_{}", column))?;
    draw(&path, column, lo, hi, &counts).map_err(|e| render_error(kind, e))?;
    log_written(kind, &path);
    Ok(path)
}

/// Bin edges span `[lo, hi]`; the last bin is closed on the right.
fn bin_counts(sorted: &[f64]) -> (f64, f64, Vec<usize>) {
    let n = sorted.len();
    let (mut lo, mut hi) = (sorted[0], sorted[n - 1]);
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }

    let bins = bin_count(sorted, hi - lo);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in sorted {
        let at = (((v - lo) / width) as usize).min(bins - 1);
        counts[at] += 1;
    }
    (lo, hi, counts)
}

/// Larger of the Sturges and Freedman-Diaconis estimates
fn bin_count(sorted: &[f64], range: f64) -> usize {
    let n = sorted.len() as f64;
    let sturges = n.log2().ceil() as usize + 1;
    let iqr = match (quantile_sorted(sorted, 0.25), quantile_sorted(sorted, 0.75)) {
        (Some(q1), Some(q3)) => q3 - q1,
        _ => 0.0,
    };
    let fd_width = 2.0 * iqr / n.cbrt();
    let fd = if fd_width > 0.0 {
        (range / fd_width).ceil() as usize
    } else {
        0
    };
    sturges.max(fd).clamp(1, MAX_BINS)
}

fn draw(path: &Path, column: &str, lo: f64, hi: f64, counts: &[usize]) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let width = (hi - lo) / counts.len() as f64;
    let y_max = counts.iter().copied().max().unwrap_or(1) as f64 * 1.1;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Distribution of {}", column), CAPTION_FONT)
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Count")
        .label_style(LABEL_FONT)
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = lo + i as f64 * width;
        Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], BLUE.mix(0.6).filled())
    }))?;

    root.present()?;
    Ok(())
}
