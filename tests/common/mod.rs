//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tempfile::TempDir;

/// Small policy table for the exploratory branch
///
/// This DataFrame includes:
/// - `Date`: text dates over three months (Jan, Feb, Apr 2015; March is empty)
/// - `Province`: three provinces, Gauteng first
/// - `TotalPremium` / `TotalClaims`: premium 100 per row, a few claims
/// - `CustomValueEstimate`: one extreme value (row 7)
/// - `Make` / `Model`: two vehicles
pub fn create_claims_dataframe() -> DataFrame {
    df! {
        "Date" => [
            "2015-01-05", "2015-01-20", "2015-01-31", "2015-02-01",
            "2015-02-14", "2015-02-28", "2015-04-02", "2015-04-30",
        ],
        "Province" => [
            "Gauteng", "Western Cape", "Gauteng", "KwaZulu-Natal",
            "Western Cape", "Gauteng", "KwaZulu-Natal", "Gauteng",
        ],
        "TotalPremium" => [100.0f64, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0],
        "TotalClaims" => [0.0f64, 50.0, 150.0, 0.0, 0.0, 300.0, 20.0, 0.0],
        "CustomValueEstimate" => [
            Some(10_000.0f64), Some(11_000.0), Some(12_000.0), None,
            Some(10_500.0), Some(11_500.0), Some(12_500.0), Some(250_000.0),
        ],
        "Make" => ["TOYOTA", "TOYOTA", "VW", "TOYOTA", "VW", "VW", "TOYOTA", "VW"],
        "Model" => ["QUANTUM", "QUANTUM", "POLO", "QUANTUM", "POLO", "POLO", "QUANTUM", "POLO"],
    }
    .unwrap()
}

/// Synthetic claims for the modeling branch
///
/// Claim severity grows with `SumInsured` and `Kilowatts` and carries a
/// province effect. Every fifth row has no claim and `CapitalOutstanding` is
/// stored as text, so the cleaning passes have work to do.
pub fn create_modeling_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let provinces = ["Gauteng", "Western Cape", "Limpopo"];
    let genders = ["Male", "Female"];
    let vehicle_types = ["Passenger Vehicle", "Medium Commercial"];

    let mut cubic = Vec::with_capacity(rows);
    let mut kilowatts = Vec::with_capacity(rows);
    let mut capital = Vec::with_capacity(rows);
    let mut sum_insured = Vec::with_capacity(rows);
    let mut new_vehicle = Vec::with_capacity(rows);
    let mut gender = Vec::with_capacity(rows);
    let mut province = Vec::with_capacity(rows);
    let mut vehicle_type = Vec::with_capacity(rows);
    let mut claims = Vec::with_capacity(rows);

    for i in 0..rows {
        let kw: f64 = rng.gen_range(50.0..150.0);
        let insured: f64 = rng.gen_range(10_000.0..500_000.0);
        let p = i % provinces.len();

        cubic.push(rng.gen_range(1000.0..3000.0f64).round());
        kilowatts.push(kw.round());
        capital.push(format!("{:.0}", rng.gen_range(0.0..200_000.0f64)));
        sum_insured.push(insured.round());
        new_vehicle.push(if rng.gen_bool(0.3) { "More than 6 months" } else { "Less than 6 months" });
        gender.push(genders[i % genders.len()]);
        province.push(provinces[p]);
        vehicle_type.push(vehicle_types[(i / 3) % vehicle_types.len()]);

        let severity = 0.02 * insured + 40.0 * kw + 2_000.0 * p as f64 + rng.gen_range(0.0..500.0);
        claims.push(if i % 5 == 0 { 0.0 } else { severity });
    }

    df! {
        "Cubiccapacity" => cubic,
        "Kilowatts" => kilowatts,
        "CapitalOutstanding" => capital,
        "SumInsured" => sum_insured,
        "NewVehicle" => new_vehicle,
        "Gender" => gender,
        "Province" => province,
        "VehicleType" => vehicle_type,
        "TotalClaims" => claims,
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    create_temp_delimited(df, "test_data.csv", b',')
}

/// Create a temporary directory with a pipe-separated `.txt` file
pub fn create_temp_pipe_txt(df: &mut DataFrame) -> (TempDir, PathBuf) {
    create_temp_delimited(df, "test_data.txt", b'|')
}

fn create_temp_delimited(df: &mut DataFrame, name: &str, separator: u8) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);

    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file)
        .with_separator(separator)
        .finish(df)
        .unwrap();

    (temp_dir, path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has all expected columns
pub fn assert_has_columns(df: &DataFrame, expected: &[&str]) {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for column in expected {
        assert!(
            names.contains(&column.to_string()),
            "Expected column '{}' not found in {:?}",
            column,
            names
        );
    }
}

/// Assert two floats agree to within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} to be within {} of {}",
        actual,
        tol,
        expected
    );
}
