//! HTTP API for sizing, catalog lookups, health checks and Prometheus metrics

use crate::health::{ComponentStatus, HealthRegistry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use sizer_lib::{
    annotate,
    validation::validate_named,
    Annotation, BatchReport, Engine, Environment, InstanceShape, NamedWorkload, Region,
    SizingEngine, SizingMetrics, SpecError, StructuredLogger, ValidationError, WorkloadAnalysis,
    WorkloadSpec,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: SizingMetrics,
    pub logger: StructuredLogger,
    pub engine: SizingEngine,
    pub default_region: Region,
    pub max_batch_size: usize,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, engine: SizingEngine) -> Self {
        Self {
            health_registry,
            metrics: SizingMetrics::new(),
            logger: StructuredLogger::new("sizer-api"),
            engine,
            default_region: Region::UsEast1,
            max_batch_size: 500,
        }
    }

    pub fn with_limits(mut self, default_region: Region, max_batch_size: usize) -> Self {
        self.default_region = default_region;
        self.max_batch_size = max_batch_size;
        self
    }
}

/// A batch entry that failed validation
#[derive(Debug, Clone, Serialize)]
pub struct InvalidEntry {
    pub index: usize,
    pub name: String,
    pub issues: Vec<ValidationError>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Spec(#[from] SpecError),

    #[error("{} batch entries failed validation", .0.len())]
    InvalidBatch(Vec<InvalidEntry>),

    #[error("batch of {size} databases exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a, T: Serialize> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<T>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Spec(SpecError::Invalid(issues)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: "validation_failed",
                    message,
                    details: Some(issues),
                }),
            )
                .into_response(),
            ApiError::Spec(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::<()> {
                    error: "bad_request",
                    message,
                    details: None,
                }),
            )
                .into_response(),
            ApiError::InvalidBatch(entries) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: "validation_failed",
                    message,
                    details: Some(entries),
                }),
            )
                .into_response(),
            ApiError::BatchTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorBody::<()> {
                    error: "batch_too_large",
                    message,
                    details: None,
                }),
            )
                .into_response(),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::<()> {
                    error: "internal",
                    message,
                    details: None,
                }),
            )
                .into_response(),
        }
    }
}

/// Body of `POST /api/v1/sizing`
///
/// Optional fields fall back to the workload defaults; a missing region
/// falls back to the service's default region.
#[derive(Debug, Clone, Deserialize)]
pub struct SizingRequest {
    pub engine: Engine,
    #[serde(default)]
    pub region: Option<Region>,
    pub cores: u32,
    pub cpu_util_pct: u32,
    pub ram_gb: u32,
    pub ram_util_pct: u32,
    pub storage_gb: u32,
    #[serde(default)]
    pub iops: Option<u32>,
    #[serde(default)]
    pub growth_pct_annual: Option<f64>,
    #[serde(default)]
    pub backup_retention_days: Option<u32>,
    #[serde(default)]
    pub data_transfer_gb_month: Option<u32>,
    /// Environments to size; all four when absent
    #[serde(default)]
    pub environments: Option<Vec<Environment>>,
}

impl SizingRequest {
    pub fn into_spec(self, default_region: Region) -> Result<WorkloadSpec, SpecError> {
        let mut builder = WorkloadSpec::builder()
            .engine(self.engine)
            .region(self.region.unwrap_or(default_region))
            .cores(self.cores)
            .cpu_util_pct(self.cpu_util_pct)
            .ram_gb(self.ram_gb)
            .ram_util_pct(self.ram_util_pct)
            .storage_gb(self.storage_gb);

        if let Some(iops) = self.iops {
            builder = builder.iops(iops);
        }
        if let Some(growth) = self.growth_pct_annual {
            builder = builder.growth_pct_annual(growth);
        }
        if let Some(days) = self.backup_retention_days {
            builder = builder.backup_retention_days(days);
        }
        if let Some(gb) = self.data_transfer_gb_month {
            builder = builder.data_transfer_gb_month(gb);
        }

        builder.build()
    }
}

/// Body of `POST /api/v1/sizing/batch`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub databases: Vec<NamedWorkload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightsRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionEntry {
    pub region: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionsResponse {
    pub base_region: String,
    pub regions: Vec<RegionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapesResponse {
    pub region: String,
    pub engine: Engine,
    /// False when the shapes came from a fallback region, engine or the
    /// generic shape
    pub exact: bool,
    pub shapes: Vec<InstanceShape>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn catalog_regions(State(state): State<Arc<AppState>>) -> Json<RegionsResponse> {
    let catalog = state.engine.catalog();
    Json(RegionsResponse {
        base_region: catalog.base_region().to_string(),
        regions: catalog
            .regions()
            .map(|(region, multiplier)| RegionEntry {
                region: region.to_string(),
                multiplier,
            })
            .collect(),
    })
}

async fn catalog_shapes(
    State(state): State<Arc<AppState>>,
    Path((region, engine)): Path<(String, String)>,
) -> Result<Json<ShapesResponse>, ApiError> {
    let engine: Engine = engine.parse()?;
    let catalog = state.engine.catalog();
    let exact = catalog.has_exact(&region, engine);

    if !exact {
        state.metrics.inc_catalog_fallbacks();
        state
            .logger
            .log_catalog_fallback(&region, engine.as_str(), catalog.base_region());
    }

    Ok(Json(ShapesResponse {
        shapes: catalog.shapes_for(&region, engine).to_vec(),
        region,
        engine,
        exact,
    }))
}

async fn size_workload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SizingRequest>,
) -> Result<Json<WorkloadAnalysis>, ApiError> {
    let environments = request
        .environments
        .clone()
        .filter(|envs| !envs.is_empty())
        .unwrap_or_else(|| Environment::ALL.to_vec());

    let spec = match request.into_spec(state.default_region) {
        Ok(spec) => spec,
        Err(err) => {
            if let SpecError::Invalid(issues) = &err {
                state.metrics.inc_validation_failures();
                state.logger.log_validation_failure("sizing", issues);
            }
            return Err(err.into());
        }
    };

    let started = Instant::now();
    let analysis = state.engine.analyze_environments(&spec, &environments);
    let elapsed = started.elapsed().as_secs_f64();

    state.metrics.observe_sizing_latency(elapsed);
    state.metrics.record_results(&analysis.results);
    state.logger.log_sizing(&spec, &analysis.results, elapsed);

    Ok(Json(analysis))
}

async fn size_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let databases = request.databases;
    if databases.len() > state.max_batch_size {
        return Err(ApiError::BatchTooLarge {
            size: databases.len(),
            limit: state.max_batch_size,
        });
    }

    let invalid: Vec<InvalidEntry> = databases
        .iter()
        .enumerate()
        .filter_map(|(index, db)| {
            validate_named(db).err().map(|issues| InvalidEntry {
                index,
                name: db.name.clone(),
                issues,
            })
        })
        .collect();
    if !invalid.is_empty() {
        state.metrics.inc_validation_failures();
        for entry in &invalid {
            state.logger.log_validation_failure(&entry.name, &entry.issues);
        }
        state.logger.log_batch_rejected(databases.len(), invalid.len());
        return Err(ApiError::InvalidBatch(invalid));
    }

    state.metrics.observe_batch_size(databases.len());
    let started = Instant::now();

    let engine = state.engine.clone();
    let reports = tokio::task::spawn_blocking(move || engine.analyze_batch(&databases))
        .await
        .map_err(|e| {
            error!(error = %e, "Batch sizing task failed");
            ApiError::Internal(e.to_string())
        })?;

    for report in &reports {
        state.metrics.record_results(&report.analysis.results);
    }
    let report = BatchReport::new(reports);
    state
        .logger
        .log_batch(&report.summary, started.elapsed().as_secs_f64());

    Ok(Json(report))
}

async fn insights(Json(request): Json<InsightsRequest>) -> Json<Annotation> {
    Json(annotate(&request.text))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/catalog/regions", get(catalog_regions))
        .route("/api/v1/catalog/:region/:engine", get(catalog_shapes))
        .route("/api/v1/sizing", post(size_workload))
        .route("/api/v1/sizing/batch", post(size_batch))
        .route("/api/v1/insights", post(insights))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
