//! Sizing API - HTTP service for database instance sizing
//!
//! Loads the built-in pricing catalog once and serves sizing, batch, catalog
//! and insight requests alongside health and metrics endpoints.

use anyhow::Result;
use sizer_api::{
    api::{self, AppState},
    health::{assess_catalog, components, HealthRegistry},
    ApiConfig,
};
use sizer_lib::{PricingCatalog, SizingEngine, StructuredLogger};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting sizer-api");

    let config = ApiConfig::load()?;
    let default_region = config.default_region()?;
    info!(
        default_region = %default_region,
        max_batch_size = config.max_batch_size,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CATALOG).await;
    health_registry.register(components::ENGINE).await;

    let catalog = PricingCatalog::builtin();
    let gaps = assess_catalog(&health_registry, &catalog).await;
    if !gaps.is_empty() {
        warn!(gaps = ?gaps, "Catalog has fallback-only entries");
    }

    let engine = SizingEngine::new(Arc::new(catalog));
    let state = AppState::new(health_registry.clone(), engine)
        .with_limits(default_region, config.max_batch_size);
    let logger = StructuredLogger::new("sizer-api");
    let addr = config.listen_addr();
    logger.log_startup(SERVICE_VERSION, &addr);

    health_registry.set_ready(true).await;

    tokio::select! {
        result = api::serve(addr, Arc::new(state)) => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
