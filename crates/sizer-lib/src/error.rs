//! Error types for workload construction and bulk input

use serde::Serialize;
use thiserror::Error;

/// A single range violation found while validating a workload
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} must be greater than 0")]
    NotPositive { field: &'static str },

    #[error("{field} cannot exceed 100%")]
    UtilizationAbove100 { field: &'static str, value: u32 },

    #[error("growth rate cannot be negative")]
    NegativeGrowth { value: f64 },

    #[error("growth rate must be a finite number")]
    NonFiniteGrowth,

    #[error("backup retention must be between 1 and 35 days, got {value}")]
    BackupRetention { value: u32 },

    #[error("projection horizon must be between 1 and 30 years, got {value}")]
    ProjectionYears { value: u32 },

    #[error("{field} of {value} seems unrealistic (limit {limit})")]
    Unrealistic {
        field: &'static str,
        value: f64,
        limit: f64,
    },
}

impl ValidationError {
    /// Name of the offending workload field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NotPositive { field }
            | ValidationError::UtilizationAbove100 { field, .. }
            | ValidationError::Unrealistic { field, .. } => field,
            ValidationError::NegativeGrowth { .. } | ValidationError::NonFiniteGrowth => {
                "growth_pct_annual"
            }
            ValidationError::BackupRetention { .. } => "backup_retention_days",
            ValidationError::ProjectionYears { .. } => "projection_years",
        }
    }
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure to construct a workload specification
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown database engine `{0}`")]
    UnknownEngine(String),

    #[error("unsupported region `{0}`")]
    UnknownRegion(String),

    #[error("unknown environment `{0}`")]
    UnknownEnvironment(String),

    #[error("invalid workload: {}", join_issues(.0))]
    Invalid(Vec<ValidationError>),
}

/// Failure that prevents a bulk input file from being read at all
///
/// Problems confined to a single row are reported as [`crate::bulk::RowError`]
/// instead, so the remaining rows can still be sized.
#[derive(Debug, Error)]
pub enum BulkInputError {
    #[error("failed to read CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("unsupported input format `{0}` (expected .csv or .json)")]
    UnsupportedFormat(String),
}
