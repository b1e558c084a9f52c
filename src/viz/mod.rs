//! SVG chart rendering
//!
//! Each `plot_*` function reads what it needs from its input, writes one SVG
//! file into the given directory and returns the file's path. Nothing drawn
//! here feeds back into the pipeline.

mod bar;
mod boxplot;
mod heatmap;
mod histogram;
mod line;

pub use bar::{plot_attribution, plot_loss_ratio_by_category};
pub use boxplot::plot_boxplot;
pub use heatmap::plot_correlation_matrix;
pub use histogram::plot_distribution;
pub use line::plot_temporal_trend;

use std::fmt;
use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use polars::prelude::DataFrame;
use tracing::info;

use crate::error::{DataError, VisualizationError};

/// Pixel size of every chart
pub const CHART_SIZE: (u32, u32) = (1024, 640);

pub(crate) const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);
pub(crate) const LABEL_FONT: (&str, u32) = ("sans-serif", 14);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Histogram,
    Line,
    Heatmap,
    Boxplot,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "histogram",
            ChartKind::Line => "line",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Boxplot => "boxplot",
        };
        write!(f, "{}", name)
    }
}

/// A chart to draw from the record table
#[derive(Debug, Clone)]
pub enum ChartRequest {
    LossRatioByCategory {
        category: String,
        claims: String,
        premium: String,
    },
    Distribution {
        column: String,
    },
    TemporalTrend {
        date_column: String,
        value_column: String,
    },
    CorrelationMatrix {
        columns: Vec<String>,
    },
    Boxplot {
        column: String,
        group_by: Option<String>,
    },
}

impl ChartRequest {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartRequest::LossRatioByCategory { .. } => ChartKind::Bar,
            ChartRequest::Distribution { .. } => ChartKind::Histogram,
            ChartRequest::TemporalTrend { .. } => ChartKind::Line,
            ChartRequest::CorrelationMatrix { .. } => ChartKind::Heatmap,
            ChartRequest::Boxplot { .. } => ChartKind::Boxplot,
        }
    }
}

/// Draw one requested chart into `dir`.
pub fn render(df: &DataFrame, request: &ChartRequest, dir: &Path) -> Result<PathBuf, VisualizationError> {
    match request {
        ChartRequest::LossRatioByCategory {
            category,
            claims,
            premium,
        } => plot_loss_ratio_by_category(df, category, claims, premium, dir),
        ChartRequest::Distribution { column } => plot_distribution(df, column, dir),
        ChartRequest::TemporalTrend {
            date_column,
            value_column,
        } => plot_temporal_trend(df, date_column, value_column, dir),
        ChartRequest::CorrelationMatrix { columns } => plot_correlation_matrix(df, columns, dir),
        ChartRequest::Boxplot { column, group_by } => plot_boxplot(df, column, group_by.as_deref(), dir),
    }
}

/// Output path for a chart, creating the directory if needed
pub(crate) fn chart_path(dir: &Path, kind: ChartKind, stem: &str) -> Result<PathBuf, VisualizationError> {
    std::fs::create_dir_all(dir).map_err(|e| VisualizationError::Render {
        chart: kind.to_string(),
        reason: format!("cannot create {}: {}", dir.display(), e),
    })?;
    Ok(dir.join(format!("{}.svg", file_stem(stem))))
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Map a data-access failure onto the chart that needed the data
pub(crate) fn data_error(kind: ChartKind, error: DataError) -> VisualizationError {
    match error {
        DataError::MissingColumn(column) => VisualizationError::MissingColumn {
            chart: kind.to_string(),
            column,
        },
        source => VisualizationError::Data {
            chart: kind.to_string(),
            source,
        },
    }
}

pub(crate) fn render_error(kind: ChartKind, error: DrawingAreaErrorKind<std::io::Error>) -> VisualizationError {
    VisualizationError::Render {
        chart: kind.to_string(),
        reason: error.to_string(),
    }
}

pub(crate) fn empty_data(kind: ChartKind, column: &str) -> VisualizationError {
    VisualizationError::EmptyData {
        chart: kind.to_string(),
        column: column.to_string(),
    }
}

pub(crate) fn log_written(kind: ChartKind, path: &Path) {
    info!("Saved {} chart to {}", kind, path.display());
}

/// Axis range padded on both sides; never empty
pub(crate) fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if max <= min {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// Label of the category at an integer axis position
pub(crate) fn category_label(labels: &[String], position: f64) -> String {
    let rounded = position.round();
    if (position - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_is_filesystem_safe() {
        assert_eq!(file_stem("loss ratio/Province"), "loss_ratio_province");
    }

    #[test]
    fn test_padded_range_never_empty() {
        assert_eq!(padded_range(3.0, 3.0), (2.0, 4.0));
        let (lo, hi) = padded_range(0.0, 10.0);
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn test_category_label_only_on_integer_positions() {
        let labels = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&labels, 1.0), "B");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 5.0), "");
    }
}
