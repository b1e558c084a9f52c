//! Dataset loader for delimited and Parquet files
//!
//! Loading is split into three steps that the caller composes:
//! read the file ([`load_dataset`]), validate declared column types
//! ([`apply_column_types`]) and optionally fill numeric gaps
//! ([`impute_numeric_means`]).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::columns::{date_column, parse_date_text, parse_numeric_text};
use crate::error::{DataError, LoadError};

/// Default number of rows used for CSV schema inference
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Options controlling how a file is read
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator; sniffed from the header line when `None`
    pub separator: Option<u8>,
    /// Rows used for schema inference (0 = full scan)
    pub infer_schema_length: usize,
    /// Delimited columns read as text whatever their inferred type. Values
    /// are parsed afterwards, so a bad cell past the inference window drops
    /// or names one row instead of failing the read.
    pub text_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: None,
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            text_columns: Vec::new(),
        }
    }
}

/// Load a dataset from a file (delimited text or Parquet based on extension)
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<DataFrame, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match extension.as_str() {
        "csv" | "txt" => {
            let separator = match options.separator {
                Some(separator) => separator,
                None => detect_separator(path)?,
            };
            let schema_length = if options.infer_schema_length == 0 {
                None
            } else {
                Some(options.infer_schema_length)
            };
            let separator_char = separator as char;
            debug!(separator = %separator_char, "reading delimited file");

            LazyCsvReader::new(path)
                .with_has_header(true)
                .with_separator(separator)
                .with_infer_schema_length(schema_length)
                .with_dtype_overwrite(text_overrides(path, separator, &options.text_columns)?)
                .finish()
                .and_then(|lf| lf.collect())
                .map_err(|source| LoadError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
        _ => return Err(LoadError::UnsupportedFormat(extension)),
    };

    info!(
        "Successfully loaded data from {} ({} rows, {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Schema forcing the requested columns to `String`, limited to columns the
/// header actually carries
fn text_overrides(path: &Path, separator: u8, columns: &[String]) -> Result<Option<SchemaRef>, LoadError> {
    if columns.is_empty() {
        return Ok(None);
    }
    let header = read_header(path)?;
    let present: Vec<&str> = header
        .trim_end_matches(['\r', '\n'])
        .split(separator as char)
        .map(|name| name.trim().trim_matches('"'))
        .collect();

    let fields: Vec<Field> = columns
        .iter()
        .filter(|name| present.contains(&name.as_str()))
        .map(|name| Field::new(name.as_str().into(), DataType::String))
        .collect();
    if fields.is_empty() {
        return Ok(None);
    }
    debug!(columns = ?columns, "reading columns as text");
    Ok(Some(Arc::new(Schema::from_iter(fields))))
}

fn read_header(path: &Path) -> Result<String, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(header)
}

/// Sniff the field separator from the header line: pipe, then tab, else comma.
pub fn detect_separator(path: &Path) -> Result<u8, LoadError> {
    let header = read_header(path)?;
    let separator = if header.contains('|') {
        b'|'
    } else if header.contains('\t') {
        b'\t'
    } else {
        b','
    };
    Ok(separator)
}

/// Declared storage kind for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Number,
    Text,
    Date,
}

impl ColumnKind {
    fn label(self) -> &'static str {
        match self {
            ColumnKind::Number => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
        }
    }
}

/// Per-column type declarations, validated once right after loading
#[derive(Debug, Clone, Default)]
pub struct ColumnTypes {
    kinds: BTreeMap<String, ColumnKind>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the kind of one column
    pub fn with(mut self, column: impl Into<String>, kind: ColumnKind) -> Self {
        self.kinds.insert(column.into(), kind);
        self
    }

    pub fn get(&self, column: &str) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.kinds.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

/// Convert and validate every declared column.
///
/// A declared column that is missing, or that holds a single value which
/// cannot be read as its declared kind, fails the whole load.
pub fn apply_column_types(mut df: DataFrame, types: &ColumnTypes) -> Result<DataFrame, LoadError> {
    for (name, kind) in types.iter() {
        let column = df
            .column(name)
            .map_err(|_| LoadError::MissingColumn(name.to_string()))?;
        let dtype = column.dtype().clone();

        let converted = match (kind, &dtype) {
            (ColumnKind::Date, DataType::Date) => None,
            (ColumnKind::Date, DataType::Datetime(_, _)) => Some(column.cast(&DataType::Date)?),
            (ColumnKind::Date, DataType::String) => {
                let mut dates = Vec::with_capacity(column.len());
                for (row, value) in column.str()?.into_iter().enumerate() {
                    match value {
                        None => dates.push(None),
                        Some(text) => match parse_date_text(text) {
                            Some(date) => dates.push(Some(date)),
                            None => {
                                return Err(LoadError::DateParse {
                                    column: name.to_string(),
                                    row,
                                    value: text.to_string(),
                                })
                            }
                        },
                    }
                }
                Some(date_column(name, &dates)?)
            }
            (ColumnKind::Number, dt) if dt.is_primitive_numeric() => None,
            (ColumnKind::Number, DataType::String) => {
                let mut numbers = Vec::with_capacity(column.len());
                for (row, value) in column.str()?.into_iter().enumerate() {
                    match value {
                        None => numbers.push(None),
                        Some(text) if text.trim().is_empty() => numbers.push(None),
                        Some(text) => match parse_numeric_text(text) {
                            Some(number) => numbers.push(Some(number)),
                            None => {
                                return Err(LoadError::NumberParse {
                                    column: name.to_string(),
                                    row,
                                    value: text.to_string(),
                                })
                            }
                        },
                    }
                }
                Some(Column::new(name.into(), numbers))
            }
            (ColumnKind::Text, DataType::String) => None,
            (ColumnKind::Text, _) => Some(column.cast(&DataType::String)?),
            (kind, dt) => {
                return Err(LoadError::WrongType {
                    column: name.to_string(),
                    expected: kind.label(),
                    actual: dt.to_string(),
                })
            }
        };

        if let Some(converted) = converted {
            debug!(column = name, kind = kind.label(), "converted declared column");
            df.with_column(converted)?;
        }
    }
    Ok(df)
}

/// Convert text columns whose every non-missing value parses as a date.
///
/// A column with any unparseable value is left untouched. Returns the table
/// and the names of the converted columns.
pub fn infer_date_columns(mut df: DataFrame) -> Result<(DataFrame, Vec<String>), LoadError> {
    let text_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype() == &DataType::String)
        .map(|col| col.name().to_string())
        .collect();

    let mut converted = Vec::new();
    for name in text_columns {
        let column = df.column(&name)?;
        let mut dates = Vec::with_capacity(column.len());
        let mut parsed_any = false;
        let mut all_parsed = true;

        for value in column.str()?.into_iter() {
            match value {
                None => dates.push(None),
                Some(text) => match parse_date_text(text) {
                    Some(date) => {
                        parsed_any = true;
                        dates.push(Some(date));
                    }
                    None => {
                        all_parsed = false;
                        break;
                    }
                },
            }
        }

        if all_parsed && parsed_any {
            df.with_column(date_column(&name, &dates)?)?;
            converted.push(name);
        }
    }

    if !converted.is_empty() {
        info!("Inferred date columns: {}", converted.join(", "));
    }
    Ok((df, converted))
}

/// A numeric column whose gaps were filled
#[derive(Debug, Clone, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    pub mean: f64,
    pub filled: usize,
}

/// Result of mean imputation
#[derive(Debug, Clone)]
pub struct Imputation {
    pub table: DataFrame,
    pub imputed: Vec<ImputedColumn>,
    /// Numeric columns with no observed value; left missing
    pub skipped: Vec<String>,
}

/// Fill missing numeric cells with the mean of the column's observed values.
///
/// NaN counts as missing: it is left out of the mean and filled like a null.
/// Entirely-missing columns have no defined mean and are skipped. Filled
/// columns are stored as `Float64`.
pub fn impute_numeric_means(df: DataFrame) -> Result<Imputation, DataError> {
    let mut table = df;
    let candidates: Vec<String> = table
        .get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| col.name().to_string())
        .collect();

    let mut imputed = Vec::new();
    let mut skipped = Vec::new();

    for name in candidates {
        let values = super::columns::numeric_values(&table, &name)?;
        let observed: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
        if observed.len() == values.len() {
            continue;
        }
        if observed.is_empty() {
            warn!(column = %name, "column is entirely missing; left unimputed");
            skipped.push(name);
            continue;
        }

        let mean = observed.iter().sum::<f64>() / observed.len() as f64;
        let filled = values.len() - observed.len();
        let replaced: Vec<f64> = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(mean))
            .collect();
        table.with_column(Column::new(name.as_str().into(), replaced))?;

        debug!(column = %name, mean, filled, "imputed missing values");
        imputed.push(ImputedColumn {
            column: name,
            mean,
            filled,
        });
    }

    Ok(Imputation {
        table,
        imputed,
        skipped,
    })
}

/// Column names of a loaded table
pub fn get_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}
