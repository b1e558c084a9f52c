//! Tests for the exploratory analyses

use claimlens::analysis::*;
use claimlens::error::DataError;
use claimlens::pipeline::*;
use chrono::NaiveDate;
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn dated_claims() -> DataFrame {
    let (df, converted) = infer_date_columns(create_claims_dataframe()).unwrap();
    assert_eq!(converted, vec!["Date".to_string()]);
    df
}

#[test]
fn test_loss_ratio_on_fixture() {
    let df = create_claims_dataframe();

    let overall = loss_ratio(&df, "TotalClaims", "TotalPremium").unwrap();

    assert_eq!(overall.total_claims, 520.0);
    assert_eq!(overall.total_premium, 800.0);
    assert_close(overall.ratio, 0.65, 1e-12);
}

#[test]
fn test_loss_ratio_is_scale_invariant() {
    let base = df! {
        "claims" => [10.0f64, 0.0, 35.0],
        "premium" => [20.0f64, 20.0, 40.0],
    }
    .unwrap();
    let scaled = df! {
        "claims" => [10_000.0f64, 0.0, 35_000.0],
        "premium" => [20_000.0f64, 20_000.0, 40_000.0],
    }
    .unwrap();

    let a = loss_ratio(&base, "claims", "premium").unwrap();
    let b = loss_ratio(&scaled, "claims", "premium").unwrap();

    assert_close(a.ratio, b.ratio, 1e-12);
}

#[test]
fn test_zero_premium_gives_non_finite_ratio() {
    let df = df! {
        "claims" => [5.0f64],
        "premium" => [0.0f64],
    }
    .unwrap();

    let ratio = loss_ratio(&df, "claims", "premium").unwrap();

    assert!(ratio.ratio.is_infinite());
}

#[test]
fn test_grouped_loss_ratio_keeps_first_appearance_order() {
    let df = create_claims_dataframe();

    let groups = grouped_loss_ratio(&df, &names(&["Province"]), "TotalClaims", "TotalPremium").unwrap();

    let labels: Vec<String> = groups.iter().map(|g| g.label()).collect();
    assert_eq!(labels, vec!["Gauteng", "Western Cape", "KwaZulu-Natal"]);
    assert_eq!(groups[0].rows, 4);
    assert_eq!(groups[0].total_claims, 450.0);
    assert_close(groups[0].ratio, 1.125, 1e-12);
    assert_close(groups[1].ratio, 0.25, 1e-12);
    assert_close(groups[2].ratio, 0.1, 1e-12);

    // Group totals add back up to the overall totals
    let claims: f64 = groups.iter().map(|g| g.total_claims).sum();
    let premium: f64 = groups.iter().map(|g| g.total_premium).sum();
    assert_eq!(claims, 520.0);
    assert_eq!(premium, 800.0);
}

#[test]
fn test_grouped_loss_ratio_missing_key() {
    let df = df! {
        "Province" => [Some("Gauteng"), None, Some("Gauteng")],
        "TotalClaims" => [10.0f64, 20.0, 30.0],
        "TotalPremium" => [100.0f64, 100.0, 100.0],
    }
    .unwrap();

    let groups = grouped_loss_ratio(&df, &names(&["Province"]), "TotalClaims", "TotalPremium").unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].key, vec![MISSING_LABEL.to_string()]);
    assert_close(groups[1].ratio, 0.2, 1e-12);
}

#[test]
fn test_grouped_loss_ratio_without_columns_is_rejected() {
    let df = create_claims_dataframe();

    assert!(matches!(
        grouped_loss_ratio(&df, &[], "TotalClaims", "TotalPremium"),
        Err(DataError::InvalidParameter(_))
    ));
}

#[test]
fn test_loss_ratio_by_category_is_sorted_descending() {
    let df = create_claims_dataframe();

    let groups = loss_ratio_by_category(&df, "Province", "TotalClaims", "TotalPremium").unwrap();

    let labels: Vec<String> = groups.iter().map(|g| g.label()).collect();
    assert_eq!(labels, vec!["Gauteng", "Western Cape", "KwaZulu-Natal"]);
    assert!(groups.windows(2).all(|w| w[0].ratio >= w[1].ratio));
}

#[test]
fn test_distribution_stats_skips_text_columns() {
    let df = create_claims_dataframe();

    let stats = distribution_stats(&df, &names(&["TotalPremium", "Province", "CustomValueEstimate"])).unwrap();

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].column, "TotalPremium");
    assert_eq!(stats[0].mean, Some(100.0));
    assert_eq!(stats[0].std, Some(0.0));
    assert_eq!(stats[1].count, 7);
    // One extreme value gives a long right tail
    assert!(stats[1].skewness.unwrap() > 1.0);
}

#[test]
fn test_distribution_stats_missing_column_is_an_error() {
    let df = create_claims_dataframe();

    assert!(matches!(
        distribution_stats(&df, &names(&["Nope"])),
        Err(DataError::MissingColumn(c)) if c == "Nope"
    ));
}

#[test]
fn test_iqr_flags_the_extreme_estimate() {
    let df = create_claims_dataframe();

    let flagged = detect_outliers(&df, &names(&["CustomValueEstimate"]), OutlierMethod::Iqr).unwrap();

    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].rows, vec![7]);
}

#[test]
fn test_constant_column_has_no_outliers() {
    let df = df! { "x" => [5.0f64, 5.0, 5.0, 5.0] }.unwrap();

    for method in [OutlierMethod::Iqr, OutlierMethod::ZScore { threshold: 3.0 }] {
        let flagged = detect_outliers(&df, &names(&["x"]), method).unwrap();
        assert!(flagged[0].rows.is_empty(), "{} flagged a constant column", method);
    }
}

#[test]
fn test_outlier_methods_on_small_sample() {
    let df = df! { "x" => [1.0f64, 2.0, 3.0, 4.0, 100.0] }.unwrap();
    let columns = names(&["x"]);

    let iqr = detect_outliers(&df, &columns, OutlierMethod::Iqr).unwrap();
    assert_eq!(iqr[0].rows, vec![4]);

    // With five points the largest attainable |z| is below 1.8
    let strict = detect_outliers(&df, &columns, OutlierMethod::ZScore { threshold: 3.0 }).unwrap();
    assert!(strict[0].rows.is_empty());

    let loose = detect_outliers(&df, &columns, OutlierMethod::ZScore { threshold: 1.5 }).unwrap();
    assert_eq!(loose[0].rows, vec![4]);
}

#[test]
fn test_outliers_on_text_column_fail() {
    let df = create_claims_dataframe();

    assert!(matches!(
        detect_outliers(&df, &names(&["Make"]), OutlierMethod::Iqr),
        Err(DataError::WrongType { .. })
    ));
}

#[test]
fn test_temporal_trend_by_month() {
    let df = dated_claims();

    let trend = temporal_trend(&df, "Date", "TotalClaims").unwrap();

    let labels: Vec<String> = trend.iter().map(|m| m.label()).collect();
    // March has no rows and is left out
    assert_eq!(labels, vec!["2015-01", "2015-02", "2015-04"]);
    assert_eq!(trend[0].month, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
    let sums: Vec<f64> = trend.iter().map(|m| m.sum).collect();
    assert_eq!(sums, vec![200.0, 300.0, 20.0]);
    let counts: Vec<usize> = trend.iter().map(|m| m.count).collect();
    assert_eq!(counts, vec![3, 3, 2]);
    assert_eq!(trend[2].mean, Some(10.0));
}

#[test]
fn test_temporal_trend_requires_a_date_column() {
    let df = create_claims_dataframe();

    assert!(matches!(
        temporal_trend(&df, "Date", "TotalClaims"),
        Err(DataError::WrongType { column, .. }) if column == "Date"
    ));
}

#[test]
fn test_vehicle_claims_per_make_and_model() {
    let df = create_claims_dataframe();

    let vehicles = vehicle_claims(&df, "Make", "Model", "TotalClaims", "TotalPremium").unwrap();

    assert_eq!(vehicles.len(), 2);
    assert_eq!((vehicles[0].make.as_str(), vehicles[0].model.as_str()), ("TOYOTA", "QUANTUM"));
    assert_eq!(vehicles[0].claims_sum, 70.0);
    assert_eq!(vehicles[0].claims_count, 4);
    assert_eq!(vehicles[0].claims_mean, Some(17.5));
    assert_eq!(vehicles[1].make, "VW");
    assert_eq!(vehicles[1].claims_sum, 450.0);
    assert_eq!(vehicles[1].premium_sum, 400.0);
}

#[test]
fn test_correlation_matrix_is_symmetric() {
    let df = create_claims_dataframe();
    let columns = names(&["TotalPremium", "TotalClaims", "CustomValueEstimate"]);

    let matrix = correlation_matrix(&df, &columns).unwrap();

    assert_eq!(matrix.columns, columns);
    // Constant premium has no defined correlation
    assert_eq!(matrix.get("TotalPremium", "TotalPremium"), None);
    assert_eq!(matrix.get("TotalPremium", "TotalClaims"), None);
    assert_eq!(matrix.get("TotalClaims", "TotalClaims"), Some(1.0));
    assert_eq!(matrix.get("CustomValueEstimate", "CustomValueEstimate"), Some(1.0));

    let r = matrix.get("TotalClaims", "CustomValueEstimate").unwrap();
    assert_eq!(Some(r), matrix.get("CustomValueEstimate", "TotalClaims"));
    assert!((-1.0..=1.0).contains(&r));
}

#[test]
fn test_correlation_of_linear_columns() {
    let df = df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0],
        "c" => [4.0f64, 3.0, 2.0, 1.0],
    }
    .unwrap();

    let matrix = correlation_matrix(&df, &names(&["a", "b", "c"])).unwrap();

    assert_close(matrix.get("a", "b").unwrap(), 1.0, 1e-12);
    assert_close(matrix.get("a", "c").unwrap(), -1.0, 1e-12);
}
