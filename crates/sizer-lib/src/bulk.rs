//! Bulk workload input
//!
//! Reads many named workloads from a CSV or JSON file. Column names are
//! normalized (trimmed, lowercased, common aliases mapped) before use.
//! A file that lacks required columns is rejected outright; a row that cannot
//! be turned into a valid workload is reported as a [`RowError`] and the
//! remaining rows still go through.

use crate::error::BulkInputError;
use crate::models::{Engine, NamedWorkload, Region, WorkloadSpec};
use crate::validation;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Columns every bulk input must provide
pub const REQUIRED_COLUMNS: [&str; 6] = ["db_name", "engine", "region", "cores", "ram", "storage"];

/// Defaults applied to optional bulk columns
pub const BULK_DEFAULT_CPU_UTIL: u32 = 65;
pub const BULK_DEFAULT_RAM_UTIL: u32 = 75;
pub const BULK_DEFAULT_IOPS: u32 = 8000;
pub const BULK_DEFAULT_GROWTH: f64 = 15.0;
pub const BULK_DEFAULT_BACKUP_DAYS: u32 = 7;
pub const BULK_DEFAULT_DATA_TRANSFER_GB: u32 = 100;
pub const BULK_DEFAULT_YEARS: u32 = 3;

/// Map an input column name onto its canonical bulk name
fn canonical_column(raw: &str) -> String {
    let name = raw.trim().to_ascii_lowercase();
    let mapped = match name.as_str() {
        "database_name" => "db_name",
        "database_engine" => "engine",
        "aws_region" => "region",
        "cpu_cores" => "cores",
        "cpu_utilization" => "cpu_util",
        "ram_gb" => "ram",
        "ram_utilization" => "ram_util",
        "storage_gb" => "storage",
        "growth_rate" => "growth",
        "projection_years" => "years",
        "narrative" | "comments" => "notes",
        _ => return name,
    };
    mapped.to_string()
}

/// A single input row that could not be sized
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based data row (the CSV header is not counted)
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Row {} ({}): {}", self.row, name, self.message),
            None => write!(f, "Row {}: {}", self.row, self.message),
        }
    }
}

/// Outcome of reading a bulk file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkParse {
    pub records: Vec<NamedWorkload>,
    pub errors: Vec<RowError>,
}

impl BulkParse {
    fn push(&mut self, row: usize, fields: &HashMap<String, String>) {
        match workload_from_fields(fields) {
            Ok(workload) => self.records.push(workload),
            Err(message) => {
                let name = fields.get("db_name").filter(|n| !n.is_empty()).cloned();
                debug!(row = row, name = ?name, error = %message, "Skipping bulk row");
                self.errors.push(RowError { row, name, message });
            }
        }
    }
}

/// Supported bulk file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, BulkInputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            _ => Err(BulkInputError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read a bulk file, choosing the parser from its extension
pub fn parse_path(path: &Path) -> Result<BulkParse, BulkInputError> {
    let format = InputFormat::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);
    let parsed = match format {
        InputFormat::Csv => parse_csv(reader)?,
        InputFormat::Json => parse_json(reader)?,
    };

    if !parsed.errors.is_empty() {
        warn!(
            path = %path.display(),
            accepted = parsed.records.len(),
            rejected = parsed.errors.len(),
            "Some bulk rows were rejected"
        );
    }
    Ok(parsed)
}

/// Read workloads from CSV with a header row
pub fn parse_csv<R: Read>(reader: R) -> Result<BulkParse, BulkInputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader.headers()?.iter().map(canonical_column).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BulkInputError::MissingColumns(missing));
    }

    let mut parsed = BulkParse::default();
    for (index, record) in csv_reader.records().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(RowError {
                    row,
                    name: None,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let fields: HashMap<String, String> = columns
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| (column.clone(), value.to_string()))
            .collect();
        parsed.push(row, &fields);
    }

    Ok(parsed)
}

/// Read workloads from JSON
///
/// Accepts either a top-level array of objects or an object with a
/// `databases` array. Keys follow the same naming rules as CSV columns;
/// values may be strings or numbers.
pub fn parse_json<R: Read>(reader: R) -> Result<BulkParse, BulkInputError> {
    let document: serde_json::Value = serde_json::from_reader(reader)?;
    let rows = match document {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => match map.remove("databases") {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => return Err(BulkInputError::MissingColumns(vec!["databases".to_string()])),
        },
        _ => return Err(BulkInputError::MissingColumns(vec!["databases".to_string()])),
    };

    let mut parsed = BulkParse::default();
    for (index, value) in rows.into_iter().enumerate() {
        let row = index + 1;
        let serde_json::Value::Object(object) = value else {
            parsed.errors.push(RowError {
                row,
                name: None,
                message: "expected an object".to_string(),
            });
            continue;
        };

        let fields: HashMap<String, String> = object
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                (!text.is_empty()).then(|| (canonical_column(&key), text))
            })
            .collect();
        parsed.push(row, &fields);
    }

    Ok(parsed)
}

fn required<'a>(fields: &'a HashMap<String, String>, column: &str) -> Result<&'a str, String> {
    fields
        .get(column)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for `{column}`"))
}

/// Whole numbers are accepted as written; fractional values are truncated
fn parse_count(column: &str, text: &str) -> Result<u32, String> {
    let value: f64 = text
        .parse()
        .map_err(|_| format!("`{column}` is not a number: {text:?}"))?;
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(format!("`{column}` is out of range: {text}"));
    }
    Ok(value as u32)
}

fn count_or(fields: &HashMap<String, String>, column: &str, default: u32) -> Result<u32, String> {
    fields
        .get(column)
        .map_or(Ok(default), |text| parse_count(column, text))
}

fn workload_from_fields(fields: &HashMap<String, String>) -> Result<NamedWorkload, String> {
    let name = required(fields, "db_name")?.to_string();
    let engine: Engine = required(fields, "engine")?
        .parse()
        .map_err(|e: crate::SpecError| e.to_string())?;
    let region: Region = required(fields, "region")?
        .parse()
        .map_err(|e: crate::SpecError| e.to_string())?;

    let growth = match fields.get("growth") {
        Some(text) => text
            .parse::<f64>()
            .map_err(|_| format!("`growth` is not a number: {text:?}"))?,
        None => BULK_DEFAULT_GROWTH,
    };

    let spec = WorkloadSpec::builder()
        .engine(engine)
        .region(region)
        .cores(parse_count("cores", required(fields, "cores")?)?)
        .cpu_util_pct(count_or(fields, "cpu_util", BULK_DEFAULT_CPU_UTIL)?)
        .ram_gb(parse_count("ram", required(fields, "ram")?)?)
        .ram_util_pct(count_or(fields, "ram_util", BULK_DEFAULT_RAM_UTIL)?)
        .storage_gb(parse_count("storage", required(fields, "storage")?)?)
        .iops(count_or(fields, "iops", BULK_DEFAULT_IOPS)?)
        .growth_pct_annual(growth)
        .backup_retention_days(count_or(fields, "backup_days", BULK_DEFAULT_BACKUP_DAYS)?)
        .data_transfer_gb_month(count_or(
            fields,
            "data_transfer_gb",
            BULK_DEFAULT_DATA_TRANSFER_GB,
        )?)
        .build()
        .map_err(|e| e.to_string())?;

    let projection_years = count_or(fields, "years", BULK_DEFAULT_YEARS)?;
    validation::check_projection_years(projection_years).map_err(|e| e.to_string())?;

    Ok(NamedWorkload {
        name,
        spec,
        projection_years,
        notes: fields.get("notes").cloned(),
    })
}
