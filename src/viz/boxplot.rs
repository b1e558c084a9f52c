//! Box-and-whisker plot, optionally one box per group level

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use polars::prelude::DataFrame;

use super::{
    category_label, chart_path, data_error, empty_data, log_written, padded_range, render_error, ChartKind,
    CAPTION_FONT, CHART_SIZE, LABEL_FONT,
};
use crate::analysis::outliers::IQR_MULTIPLIER;
use crate::analysis::stats::{quantile_sorted, sorted_copy};
use crate::analysis::MISSING_LABEL;
use crate::error::VisualizationError;
use crate::pipeline::columns::{numeric_values, text_values};

/// Five-number summary with Tukey whiskers
#[derive(Debug, Clone, PartialEq)]
struct BoxStats {
    q1: f64,
    median: f64,
    q3: f64,
    /// Most extreme values inside the 1.5 IQR fences
    whisker_low: f64,
    whisker_high: f64,
    outliers: Vec<f64>,
}

impl BoxStats {
    fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let q1 = quantile_sorted(sorted, 0.25)?;
        let median = quantile_sorted(sorted, 0.5)?;
        let q3 = quantile_sorted(sorted, 0.75)?;
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr);

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| *v >= low_fence && *v <= high_fence)
            .collect();
        Some(Self {
            q1,
            median,
            q3,
            whisker_low: inside.first().copied().unwrap_or(q1),
            whisker_high: inside.last().copied().unwrap_or(q3),
            outliers: sorted
                .iter()
                .copied()
                .filter(|v| *v < low_fence || *v > high_fence)
                .collect(),
        })
    }
}

/// Box plot of `column`, split by the levels of `group_by` when given.
///
/// Groups are ordered by level name; rows with a missing group value form
/// their own box.
pub fn plot_boxplot(
    df: &DataFrame,
    column: &str,
    group_by: Option<&str>,
    dir: &Path,
) -> Result<PathBuf, VisualizationError> {
    let kind = ChartKind::Boxplot;
    let values = numeric_values(df, column).map_err(|e| data_error(kind, e))?;

    let groups: Vec<(String, Vec<f64>)> = match group_by {
        None => vec![(column.to_string(), values.iter().flatten().copied().collect())],
        Some(group) => {
            let keys = text_values(df, group).map_err(|e| data_error(kind, e))?;
            let mut grouped: std::collections::BTreeMap<String, Vec<f64>> = std::collections::BTreeMap::new();
            for (key, value) in keys.into_iter().zip(values.iter()) {
                if let Some(v) = value {
                    grouped
                        .entry(key.unwrap_or_else(|| MISSING_LABEL.to_string()))
                        .or_default()
                        .push(*v);
                }
            }
            grouped.into_iter().collect()
        }
    };

    let boxes: Vec<(String, BoxStats)> = groups
        .into_iter()
        .filter_map(|(label, observed)| {
            let finite: Vec<f64> = observed.into_iter().filter(|v| v.is_finite()).collect();
            BoxStats::from_sorted(&sorted_copy(&finite)).map(|stats| (label, stats))
        })
        .collect();
    if boxes.is_empty() {
        return Err(empty_data(kind, column));
    }

    let stem = match group_by {
        Some(group) => format!("boxplot_{}_by_{}", column, group),
        None => format!("boxplot_{}", column),
    };
    let title = match group_by {
        Some(group) => format!("{} by {}", column, group),
        None => column.to_string(),
    };
    let path = chart_path(dir, kind, &stem)?;
    draw(&path, &title, column, &boxes).map_err(|e| render_error(kind, e))?;
    log_written(kind, &path);
    Ok(path)
}

fn draw(path: &Path, title: &str, column: &str, boxes: &[(String, BoxStats)]) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let labels: Vec<String> = boxes.iter().map(|(label, _)| label.clone()).collect();
    let lo = boxes
        .iter()
        .flat_map(|(_, b)| b.outliers.iter().copied().chain(std::iter::once(b.whisker_low)))
        .fold(f64::INFINITY, f64::min);
    let hi = boxes
        .iter()
        .flat_map(|(_, b)| b.outliers.iter().copied().chain(std::iter::once(b.whisker_high)))
        .fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = padded_range(lo, hi);
    let n = boxes.len();

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Box plot of {}", title), CAPTION_FONT)
        .margin(16)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), lo..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x: &f64| category_label(&labels, *x))
        .y_desc(column)
        .label_style(LABEL_FONT)
        .draw()?;

    for (i, (_, stats)) in boxes.iter().enumerate() {
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.3, stats.q1), (x + 0.3, stats.q3)],
            BLUE.mix(0.25).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.3, stats.q1), (x + 0.3, stats.q3)],
            BLUE.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - 0.3, stats.median), (x + 0.3, stats.median)],
            RED.stroke_width(2),
        )))?;
        chart.draw_series(
            [
                vec![(x, stats.q3), (x, stats.whisker_high)],
                vec![(x, stats.q1), (x, stats.whisker_low)],
                vec![(x - 0.15, stats.whisker_high), (x + 0.15, stats.whisker_high)],
                vec![(x - 0.15, stats.whisker_low), (x + 0.15, stats.whisker_low)],
            ]
            .into_iter()
            .map(|points| PathElement::new(points, BLACK)),
        )?;
        chart.draw_series(
            stats
                .outliers
                .iter()
                .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
        )?;
    }

    root.present()?;
    Ok(())
}
