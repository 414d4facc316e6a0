//! Sizing library for managed cloud databases
//!
//! This crate provides the core functionality for:
//! - Per-environment instance sizing and monthly cost estimation
//! - The region/engine pricing catalog
//! - Workload validation and bulk CSV/JSON input
//! - Batch reports, cost projections and CSV/JSON export
//! - Narrative annotation and observability

pub mod bulk;
pub mod catalog;
pub mod error;
pub mod insights;
pub mod models;
pub mod observability;
pub mod report;
pub mod sizing;
pub mod validation;

pub use catalog::PricingCatalog;
pub use error::{BulkInputError, SpecError, ValidationError};
pub use insights::{annotate, Annotation};
pub use models::*;
pub use observability::{SizingMetrics, StructuredLogger};
pub use report::{BatchReport, BatchSummary, CostProjection, WorkloadReport};
pub use sizing::SizingEngine;
