//! Annotated correlation heatmap

use std::path::{Path, PathBuf};

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use polars::prelude::DataFrame;

use super::{category_label, chart_path, data_error, empty_data, log_written, render_error, ChartKind, CAPTION_FONT, CHART_SIZE, LABEL_FONT};
use crate::analysis::{correlation_matrix, CorrelationMatrix};
use crate::error::VisualizationError;

/// Pearson correlation between every pair of `columns`.
pub fn plot_correlation_matrix(df: &DataFrame, columns: &[String], dir: &Path) -> Result<PathBuf, VisualizationError> {
    let kind = ChartKind::Heatmap;
    if columns.is_empty() {
        return Err(empty_data(kind, "(no columns)"));
    }
    let matrix = correlation_matrix(df, columns).map_err(|e| data_error(kind, e))?;
    if matrix.values.iter().flatten().all(|v| v.is_none()) {
        return Err(empty_data(kind, &columns.join(", ")));
    }

    let path = chart_path(dir, kind, "correlation_matrix")?;
    draw(&path, &matrix).map_err(|e| render_error(kind, e))?;
    log_written(kind, &path);
    Ok(path)
}

/// Diverging blue-white-red scale over [-1, 1]
fn diverging(r: f64) -> RGBColor {
    let t = r.clamp(-1.0, 1.0);
    let fade = |full: u8, amount: f64| (255.0 - (255.0 - full as f64) * amount).round() as u8;
    if t >= 0.0 {
        RGBColor(fade(178, t), fade(24, t), fade(43, t))
    } else {
        RGBColor(fade(33, -t), fade(102, -t), fade(172, -t))
    }
}

fn draw(path: &Path, matrix: &CorrelationMatrix) -> Result<(), DrawingAreaErrorKind<std::io::Error>> {
    let n = matrix.columns.len();
    let labels = &matrix.columns;
    // Row 0 is drawn at the top
    let row_labels: Vec<String> = labels.iter().rev().cloned().collect();
    let range = -0.5f64..(n as f64 - 0.5);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Matrix", CAPTION_FONT)
        .margin(16)
        .x_label_area_size(60)
        .y_label_area_size(160)
        .build_cartesian_2d(range.clone(), range)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|x: &f64| category_label(labels, *x))
        .y_label_formatter(&|y: &f64| category_label(&row_labels, *y))
        .label_style(LABEL_FONT)
        .draw()?;

    let cells: Vec<(f64, f64, Option<f64>)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (j as f64, (n - 1 - i) as f64, (i, j))))
        .map(|(x, y, (i, j))| (x, y, matrix.values[i][j]))
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, value)| {
        let color = value.map(diverging).unwrap_or(RGBColor(220, 220, 220));
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
    }))?;
    chart.draw_series(cells.iter().map(|&(x, y, value)| {
        let text = value.map(|r| format!("{:.2}", r)).unwrap_or_else(|| "n/a".to_string());
        Text::new(text, (x - 0.15, y + 0.05), LABEL_FONT.into_font())
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diverging_scale_endpoints() {
        assert_eq!(diverging(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging(1.0), RGBColor(178, 24, 43));
        assert_eq!(diverging(-1.0), RGBColor(33, 102, 172));
    }
}
