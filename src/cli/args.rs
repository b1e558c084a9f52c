//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::analysis::OutlierMethod;
use crate::pipeline::{DEFAULT_INFER_SCHEMA_LENGTH, DEFAULT_SEED, DEFAULT_TEST_FRACTION};

/// ClaimLens - Exploratory analysis and baseline claim-severity models for insurance claims data
#[derive(Parser, Debug)]
#[command(name = "claimlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input file path (CSV/TXT or Parquet)
    #[arg(short, long, default_value = "data/insurance_data.csv")]
    pub input: PathBuf,

    /// Field separator for delimited input (single character or "tab").
    /// Sniffed from the header line when not given.
    #[arg(long, value_parser = parse_separator)]
    pub separator: Option<u8>,

    /// Date column used for the monthly trend
    #[arg(long, default_value = "Date")]
    pub date_column: String,

    /// Column to group loss ratios and box plots by
    #[arg(short, long, default_value = "Province")]
    pub group_by: String,

    /// Outlier detection method: "iqr" (default) or "zscore"
    #[arg(long, default_value = "iqr")]
    pub outlier_method: OutlierMethod,

    /// Directory charts are written to
    #[arg(long, default_value = "charts")]
    pub charts_dir: PathBuf,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    pub no_charts: bool,

    /// Write every analysis result to this JSON file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
    pub infer_schema_length: usize,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit linear, random forest and gradient boosting models to predict claim severity
    Model(ModelArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Input file path (CSV/TXT or Parquet)
    #[arg(short, long, default_value = "data/MachineLearningRating_v3.txt")]
    pub input: PathBuf,

    /// Field separator for delimited input; sniffed when not given
    #[arg(long, value_parser = parse_separator)]
    pub separator: Option<u8>,

    /// Seed for the train/test split and the tree ensembles
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Share of rows held out for testing, in (0, 1)
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION, value_parser = validate_test_fraction)]
    pub test_fraction: f64,

    /// Trees in the random forest
    #[arg(long, default_value = "100", value_parser = validate_positive)]
    pub n_trees: usize,

    /// Boosting rounds
    #[arg(long, default_value = "100", value_parser = validate_positive)]
    pub boosting_rounds: usize,

    /// Boosting learning rate, in (0, 1]
    #[arg(long, default_value = "0.3", value_parser = validate_learning_rate)]
    pub learning_rate: f64,

    /// Directory the attribution chart is written to
    #[arg(long, default_value = "charts")]
    pub charts_dir: PathBuf,

    /// Skip chart rendering
    #[arg(long, default_value = "false")]
    pub no_charts: bool,

    /// Number of rows to use for schema inference (CSV only)
    #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
    pub infer_schema_length: usize,
}

/// Parser for the separator flag
fn parse_separator(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!("separator must be a single ASCII character, got '{}'", s)),
            }
        }
    }
}

/// Validator for test_fraction parameter
fn validate_test_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test_fraction must be between 0.0 and 1.0 (exclusive), got {}", value))
    }
}

/// Validator for learning_rate parameter
fn validate_learning_rate(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("learning_rate must be in (0.0, 1.0], got {}", value))
    }
}

fn validate_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;
    if value == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator("|"), Ok(b'|'));
        assert_eq!(parse_separator("tab"), Ok(b'\t'));
        assert!(parse_separator("||").is_err());
        assert!(parse_separator("").is_err());
    }

    #[test]
    fn test_validate_test_fraction_bounds() {
        assert_eq!(validate_test_fraction("0.2"), Ok(0.2));
        assert!(validate_test_fraction("0").is_err());
        assert!(validate_test_fraction("1").is_err());
        assert!(validate_test_fraction("abc").is_err());
    }
}
