//! Observability infrastructure for the sizing advisor
//!
//! Provides:
//! - Prometheus metrics (sizing latency, results per environment, validation
//!   failures, catalog fallbacks, batch sizes)
//! - Structured JSON logging with tracing

use crate::models::{Environment, SizingResult, WorkloadSpec};
use crate::report::BatchSummary;
use crate::ValidationError;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for sizing latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
];

/// Histogram buckets for batch sizes (number of databases)
const BATCH_SIZE_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SizingMetricsInner> = OnceLock::new();

struct SizingMetricsInner {
    sizing_latency_seconds: Histogram,
    results_total: IntCounterVec,
    validation_failures: IntCounter,
    catalog_fallbacks: IntCounter,
    batch_size: Histogram,
}

impl SizingMetricsInner {
    fn new() -> Self {
        Self {
            sizing_latency_seconds: register_histogram!(
                "db_sizer_sizing_latency_seconds",
                "Time spent sizing one workload across its environments",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register sizing_latency_seconds"),

            results_total: register_int_counter_vec!(
                "db_sizer_results_total",
                "Sizing recommendations produced, by environment",
                &["environment"]
            )
            .expect("Failed to register results_total"),

            validation_failures: register_int_counter!(
                "db_sizer_validation_failures_total",
                "Workloads rejected by input validation"
            )
            .expect("Failed to register validation_failures"),

            catalog_fallbacks: register_int_counter!(
                "db_sizer_catalog_fallbacks_total",
                "Lookups served by a fallback region, engine or generic shape"
            )
            .expect("Failed to register catalog_fallbacks"),

            batch_size: register_histogram!(
                "db_sizer_batch_size",
                "Number of databases per batch request",
                BATCH_SIZE_BUCKETS.to_vec()
            )
            .expect("Failed to register batch_size"),
        }
    }
}

/// Sizing metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct SizingMetrics {
    _private: (),
}

impl Default for SizingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SizingMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SizingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SizingMetricsInner {
        GLOBAL_METRICS.get_or_init(SizingMetricsInner::new)
    }

    pub fn observe_sizing_latency(&self, duration_secs: f64) {
        self.inner().sizing_latency_seconds.observe(duration_secs);
    }

    /// Count one recommendation per result
    pub fn record_results(&self, results: &[SizingResult]) {
        for result in results {
            self.inner()
                .results_total
                .with_label_values(&[result.environment.as_str()])
                .inc();
        }
    }

    pub fn inc_validation_failures(&self) {
        self.inner().validation_failures.inc();
    }

    pub fn inc_catalog_fallbacks(&self) {
        self.inner().catalog_fallbacks.inc();
    }

    pub fn observe_batch_size(&self, databases: usize) {
        self.inner().batch_size.observe(databases as f64);
    }

    #[cfg(test)]
    fn results_for(&self, environment: Environment) -> u64 {
        self.inner()
            .results_total
            .with_label_values(&[environment.as_str()])
            .get()
    }
}

/// Structured logger for sizing events
///
/// Emits consistent JSON-friendly events for sizing runs, batches and
/// rejected inputs.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Log a completed sizing run for one workload
    pub fn log_sizing(&self, spec: &WorkloadSpec, results: &[SizingResult], duration_secs: f64) {
        let prod = results.iter().find(|r| r.environment == Environment::Prod);
        info!(
            event = "sizing_completed",
            service = %self.service,
            engine = %spec.engine,
            region = %spec.region,
            environments = results.len(),
            prod_instance = prod.map(|r| r.instance_type.as_str()).unwrap_or("-"),
            prod_monthly_cost = prod.map(|r| r.monthly_cost).unwrap_or_default(),
            duration_secs = duration_secs,
            "Workload sized"
        );
    }

    /// Log a catalog lookup that was served by a fallback
    pub fn log_catalog_fallback(&self, region: &str, engine: &str, served_by: &str) {
        warn!(
            event = "catalog_fallback",
            service = %self.service,
            region = %region,
            engine = %engine,
            served_by = %served_by,
            "Catalog lookup fell back"
        );
    }

    /// Log a finished batch
    pub fn log_batch(&self, summary: &BatchSummary, duration_secs: f64) {
        info!(
            event = "batch_completed",
            service = %self.service,
            databases = summary.database_count,
            prod_monthly_cost = summary.total_prod_monthly_cost,
            all_env_monthly_cost = summary.total_monthly_cost_all_envs,
            duration_secs = duration_secs,
            "Batch sized"
        );
    }

    /// Log a batch refused because some entries failed validation
    pub fn log_batch_rejected(&self, databases: usize, rejected: usize) {
        warn!(
            event = "batch_rejected",
            service = %self.service,
            databases = databases,
            rejected = rejected,
            "Batch rejected"
        );
    }

    /// Log a workload rejected by validation
    pub fn log_validation_failure(&self, source: &str, issues: &[ValidationError]) {
        let fields: Vec<&str> = issues.iter().map(ValidationError::field).collect();
        warn!(
            event = "validation_failed",
            service = %self.service,
            source = %source,
            issues = issues.len(),
            fields = ?fields,
            "Workload rejected"
        );
    }

    pub fn log_startup(&self, version: &str, bind: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            bind = %bind,
            "Sizing service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Sizing service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_metrics_creation() {
        let metrics = SizingMetrics::new();

        metrics.observe_sizing_latency(0.0002);
        metrics.inc_validation_failures();
        metrics.inc_catalog_fallbacks();
        metrics.observe_batch_size(12);
    }

    #[test]
    fn test_results_are_counted_per_environment() {
        let metrics = SizingMetrics::new();
        let engine = crate::SizingEngine::default();
        let spec = WorkloadSpec::builder()
            .engine(crate::Engine::Postgres)
            .region(crate::Region::UsEast1)
            .cores(4)
            .cpu_util_pct(50)
            .ram_gb(16)
            .ram_util_pct(50)
            .storage_gb(200)
            .build()
            .unwrap();

        let before = metrics.results_for(Environment::Qa);
        metrics.record_results(&engine.analyze(&spec).results);
        assert!(metrics.results_for(Environment::Qa) > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("sizer-api");
        assert_eq!(logger.service, "sizer-api");
    }

    #[test]
    fn test_batch_events_without_subscriber() {
        let logger = StructuredLogger::new("sizer-api");
        let summary = BatchSummary::from_reports(&[]);
        assert_eq!(summary.database_count, 0);

        logger.log_batch(&summary, 0.01);
        logger.log_batch_rejected(3, 2);
    }
}
