//! HTTP service exposing the database sizing engine
//!
//! Routes, configuration and health tracking live here so the binary and the
//! integration tests build the same router.

pub mod api;
pub mod config;
pub mod health;

pub use api::{create_router, AppState};
pub use config::ApiConfig;
pub use health::{ComponentStatus, HealthRegistry};
