//! Tests for SVG chart rendering

use claimlens::error::VisualizationError;
use claimlens::models::Attribution;
use claimlens::pipeline::*;
use claimlens::viz::*;
use polars::prelude::*;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn assert_svg(path: &std::path::Path) {
    assert!(path.exists(), "{} was not written", path.display());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("svg"));
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("<svg"), "{} is not an SVG", path.display());
}

#[test]
fn test_loss_ratio_bar_chart() {
    let temp_dir = TempDir::new().unwrap();
    let df = create_claims_dataframe();

    let path = plot_loss_ratio_by_category(&df, "Province", "TotalClaims", "TotalPremium", temp_dir.path()).unwrap();

    assert_svg(&path);
    assert_eq!(path.file_name().unwrap(), "loss_ratio_by_province.svg");
}

#[test]
fn test_distribution_histogram() {
    let temp_dir = TempDir::new().unwrap();
    let df = create_claims_dataframe();

    let path = plot_distribution(&df, "CustomValueEstimate", temp_dir.path()).unwrap();

    assert_svg(&path);
}

#[test]
fn test_temporal_trend_line() {
    let temp_dir = TempDir::new().unwrap();
    let (df, _) = infer_date_columns(create_claims_dataframe()).unwrap();

    let path = plot_temporal_trend(&df, "Date", "TotalClaims", temp_dir.path()).unwrap();

    assert_svg(&path);
}

#[test]
fn test_correlation_heatmap() {
    let temp_dir = TempDir::new().unwrap();
    let df = create_claims_dataframe();
    let columns = vec!["TotalClaims".to_string(), "CustomValueEstimate".to_string()];

    let path = plot_correlation_matrix(&df, &columns, temp_dir.path()).unwrap();

    assert_svg(&path);
}

#[test]
fn test_boxplots_plain_and_grouped() {
    let temp_dir = TempDir::new().unwrap();
    let df = create_claims_dataframe();

    let plain = plot_boxplot(&df, "TotalClaims", None, temp_dir.path()).unwrap();
    let grouped = plot_boxplot(&df, "TotalClaims", Some("Province"), temp_dir.path()).unwrap();

    assert_svg(&plain);
    assert_svg(&grouped);
    assert_ne!(plain, grouped);
}

#[test]
fn test_attribution_chart() {
    let temp_dir = TempDir::new().unwrap();
    let attribution = Attribution {
        feature_names: vec!["SumInsured".to_string(), "Kilowatts".to_string()],
        base_value: 1000.0,
        values: vec![vec![120.0, -30.0], vec![-80.0, 10.0]],
    };

    let path = plot_attribution(&attribution, temp_dir.path()).unwrap();

    assert_svg(&path);
}

#[test]
fn test_render_dispatches_every_request() {
    let temp_dir = TempDir::new().unwrap();
    let (df, _) = infer_date_columns(create_claims_dataframe()).unwrap();
    let requests = vec![
        ChartRequest::LossRatioByCategory {
            category: "Province".to_string(),
            claims: "TotalClaims".to_string(),
            premium: "TotalPremium".to_string(),
        },
        ChartRequest::Distribution {
            column: "TotalClaims".to_string(),
        },
        ChartRequest::TemporalTrend {
            date_column: "Date".to_string(),
            value_column: "TotalClaims".to_string(),
        },
        ChartRequest::CorrelationMatrix {
            columns: vec!["TotalClaims".to_string(), "CustomValueEstimate".to_string()],
        },
        ChartRequest::Boxplot {
            column: "CustomValueEstimate".to_string(),
            group_by: Some("Make".to_string()),
        },
    ];

    let kinds: Vec<ChartKind> = requests.iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ChartKind::Bar,
            ChartKind::Histogram,
            ChartKind::Line,
            ChartKind::Heatmap,
            ChartKind::Boxplot
        ]
    );
    for request in &requests {
        let path = render(&df, request, temp_dir.path()).unwrap();
        assert_svg(&path);
    }
}

#[test]
fn test_chart_directory_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("charts").join("eda");
    let df = create_claims_dataframe();

    let path = plot_distribution(&df, "TotalClaims", &nested).unwrap();

    assert!(nested.is_dir());
    assert!(path.starts_with(&nested));
}

#[test]
fn test_missing_column_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let df = create_claims_dataframe();

    match plot_distribution(&df, "Nope", temp_dir.path()) {
        Err(VisualizationError::MissingColumn { chart, column }) => {
            assert_eq!(chart, "histogram");
            assert_eq!(column, "Nope");
        }
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_all_missing_column_is_empty_data() {
    let temp_dir = TempDir::new().unwrap();
    let df = df! { "x" => [None::<f64>, None, None] }.unwrap();

    assert!(matches!(
        plot_distribution(&df, "x", temp_dir.path()),
        Err(VisualizationError::EmptyData { .. })
    ));
    assert!(matches!(
        plot_boxplot(&df, "x", None, temp_dir.path()),
        Err(VisualizationError::EmptyData { .. })
    ));
}

#[test]
fn test_trend_without_date_column_fails() {
    let temp_dir = TempDir::new().unwrap();
    let df = create_claims_dataframe();

    assert!(matches!(
        plot_temporal_trend(&df, "Date", "TotalClaims", temp_dir.path()),
        Err(VisualizationError::Data { .. })
    ));
}
