//! CSV Data Loader Module
//! Validates uploads and parses CSV bytes into a polars-backed `Dataset`.

use crate::data::Dataset;
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Cell values treated as missing, matching common table-library defaults.
pub const NULL_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Could not parse CSV at line {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("Failed to build table: {0}")]
    Table(#[from] PolarsError),
}

/// Handles upload validation and CSV parsing.
#[derive(Debug, Clone)]
pub struct DataLoader {
    max_bytes: usize,
}

impl DataLoader {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Validate an uploaded file and parse it.
    pub fn load_upload(
        &self,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Dataset, LoaderError> {
        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| LoaderError::Upload("no file was selected".to_string()))?;

        if !file_name.to_ascii_lowercase().ends_with(".csv") {
            return Err(LoaderError::Upload(format!(
                "'{file_name}' is not a .csv file"
            )));
        }
        if bytes.is_empty() {
            return Err(LoaderError::Upload(format!("'{file_name}' is empty")));
        }
        if bytes.len() > self.max_bytes {
            return Err(LoaderError::Upload(format!(
                "'{}' is {} bytes, the limit is {} bytes",
                file_name,
                bytes.len(),
                self.max_bytes
            )));
        }

        Self::parse_csv(file_name, bytes)
    }

    /// Parse comma-delimited text with a header row.
    ///
    /// Records whose field count differs from the header are rejected.
    pub fn parse_csv(file_name: &str, bytes: &[u8]) -> Result<Dataset, LoaderError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);

        let headers = reader.headers().map_err(parse_error)?.clone();
        if headers.is_empty() {
            return Err(LoaderError::Upload(
                "no columns to parse from file".to_string(),
            ));
        }
        let names = dedupe_headers(headers.iter());

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record.map_err(parse_error)?;
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(if NULL_VALUES.contains(&field) {
                    None
                } else {
                    Some(field.to_string())
                });
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(cells.iter())
            .map(|(name, values)| build_column(name, values))
            .collect();

        let df = DataFrame::new(columns)?;
        debug!(
            file = file_name,
            rows = df.height(),
            columns = df.width(),
            "parsed csv"
        );
        Ok(Dataset::new(file_name, df))
    }
}

fn parse_error(err: csv::Error) -> LoaderError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields but found {len}"),
        csv::ErrorKind::Utf8 { .. } => "content is not valid UTF-8 text".to_string(),
        _ => err.to_string(),
    };
    LoaderError::Parse { line, message }
}

/// Blank names become `Unnamed: i`; repeats get `.1`, `.2`, ... suffixes.
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (i, raw) in headers.enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }
    names
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    Integer,
    Float,
    Boolean,
    Text,
}

fn infer(values: &[Option<String>]) -> Inferred {
    let present: Vec<&str> = values.iter().flatten().map(String::as_str).collect();
    if present.is_empty() {
        return Inferred::Float;
    }
    if present.iter().all(|v| v.trim().parse::<i64>().is_ok()) {
        Inferred::Integer
    } else if present.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
        Inferred::Float
    } else if present.iter().all(|v| parse_bool(v).is_some()) {
        Inferred::Boolean
    } else {
        Inferred::Text
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn build_column(name: &str, values: &[Option<String>]) -> Column {
    match infer(values) {
        Inferred::Integer => {
            let parsed: Vec<Option<i64>> = values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.trim().parse().ok()))
                .collect();
            Column::new(name.into(), parsed)
        }
        Inferred::Float => {
            // `f64` parsing accepts any-case "nan"; those cells are missing, not values.
            let parsed: Vec<Option<f64>> = values
                .iter()
                .map(|v| {
                    v.as_deref()
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .filter(|x| !x.is_nan())
                })
                .collect();
            Column::new(name.into(), parsed)
        }
        Inferred::Boolean => {
            let parsed: Vec<Option<bool>> = values
                .iter()
                .map(|v| v.as_deref().and_then(parse_bool))
                .collect();
            Column::new(name.into(), parsed)
        }
        Inferred::Text => {
            let parsed: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
            Column::new(name.into(), parsed)
        }
    }
}
