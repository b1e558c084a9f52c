//! Tests for feature encoding and the train/test split

use claimlens::error::DataError;
use claimlens::pipeline::*;
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn small_spec() -> FeatureSpec {
    FeatureSpec {
        numeric: vec!["x".to_string()],
        categorical: vec!["level".to_string()],
        target: "y".to_string(),
    }
}

#[test]
fn test_three_levels_give_two_exclusive_indicators() {
    let df = df! {
        "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        "level" => ["B", "A", "C", "A", "B", "C"],
        "y" => [10.0f64, 20.0, 30.0, 40.0, 50.0, 60.0],
    }
    .unwrap();

    let data = build_features(&df, &small_spec()).unwrap();

    assert_eq!(data.features.names, vec!["x", "level_B", "level_C"]);
    assert_eq!(data.categories.len(), 1);
    assert_eq!(data.categories[0].dropped.as_deref(), Some("A"));
    assert_eq!(data.categories[0].encoded, vec!["B", "C"]);

    for (row, level) in data.features.rows.iter().zip(["B", "A", "C", "A", "B", "C"]) {
        let set: f64 = row[1] + row[2];
        assert!(set <= 1.0, "at most one indicator per row");
        // Reference level rows carry no indicator
        assert_eq!(set == 0.0, level == "A");
    }
    assert_eq!(data.target, vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
}

#[test]
fn test_incomplete_rows_are_dropped_before_encoding() {
    let df = df! {
        "x" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
        "level" => [Some("A"), Some("Z"), None, Some("B")],
        "y" => [Some(1.0f64), Some(2.0), Some(3.0), None],
    }
    .unwrap();

    let data = build_features(&df, &small_spec()).unwrap();

    // Only row 0 is complete; "Z" and "B" never reach the encoder
    assert_eq!(data.dropped_incomplete, 3);
    assert_eq!(data.features.n_rows(), 1);
    assert_eq!(data.features.names, vec!["x"]);
    assert_eq!(data.categories[0].dropped.as_deref(), Some("A"));
    assert!(data.categories[0].encoded.is_empty());
}

#[test]
fn test_no_complete_rows_is_an_error() {
    let df = df! {
        "x" => [None::<f64>, None],
        "level" => ["A", "B"],
        "y" => [1.0f64, 2.0],
    }
    .unwrap();

    assert!(matches!(build_features(&df, &small_spec()), Err(DataError::Empty(_))));
}

#[test]
fn test_text_numeric_feature_is_rejected() {
    let df = df! {
        "x" => ["1", "2"],
        "level" => ["A", "B"],
        "y" => [1.0f64, 2.0],
    }
    .unwrap();

    assert!(matches!(
        build_features(&df, &small_spec()),
        Err(DataError::WrongType { column, .. }) if column == "x"
    ));
}

#[test]
fn test_default_spec_on_cleaned_claims() {
    let df = create_modeling_dataframe(100, 3);
    let cleaned = filter_claims(&df, &ClaimFilter::default()).unwrap();

    let data = build_features(&cleaned.table, &FeatureSpec::default()).unwrap();

    // 4 numeric + (2-1) NewVehicle + (2-1) Gender + (3-1) Province + (2-1) VehicleType
    assert_eq!(data.features.n_features(), 9);
    assert_eq!(data.features.n_rows(), 80);
    // Gauteng sorts first and is the reference level
    assert!(!data.features.names.contains(&"Province_Gauteng".to_string()));
    assert!(data.features.names.contains(&"Province_Limpopo".to_string()));
    assert!(data.features.names.contains(&"Province_Western Cape".to_string()));
    assert!(data.features.rows.iter().all(|r| r.len() == 9));
}

#[test]
fn test_split_is_deterministic_for_a_seed() {
    let first = train_test_split(500, 0.2, 42).unwrap();
    let second = train_test_split(500, 0.2, 42).unwrap();
    let other = train_test_split(500, 0.2, 43).unwrap();

    assert_eq!(first, second);
    assert_ne!(first.test, other.test);
    assert_eq!(first.test.len(), 100);
    assert_eq!(first.train.len(), 400);
}

#[test]
fn test_split_partitions_every_row_once() {
    let partition = train_test_split(97, 0.25, 1).unwrap();

    let mut all: Vec<usize> = partition.train.iter().chain(partition.test.iter()).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..97).collect::<Vec<_>>());
}

#[test]
fn test_partition_apply_gathers_rows() {
    let features = FeatureMatrix::new(
        vec!["a".to_string()],
        vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
    );
    let target = vec![10.0, 11.0, 12.0, 13.0];
    let partition = Partition {
        train: vec![3, 0],
        test: vec![2],
    };

    let split = partition.apply(&features, &target).unwrap();

    assert_eq!(split.x_train.rows, vec![vec![3.0], vec![0.0]]);
    assert_eq!(split.y_train, vec![13.0, 10.0]);
    assert_eq!(split.x_test.rows, vec![vec![2.0]]);
    assert_eq!(split.y_test, vec![12.0]);

    let bad = Partition {
        train: vec![0],
        test: vec![9],
    };
    assert!(bad.apply(&features, &target).is_err());
}
