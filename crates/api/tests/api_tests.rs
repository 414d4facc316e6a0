//! Integration tests for the sizing API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sizer_api::{
    health::{assess_catalog, components, HealthRegistry},
    AppState,
};
use sizer_lib::{PricingCatalog, Region, SizingEngine};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_app(max_batch_size: usize) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CATALOG).await;
    health_registry.register(components::ENGINE).await;

    let state = Arc::new(
        AppState::new(health_registry, SizingEngine::default())
            .with_limits(Region::UsEast1, max_batch_size),
    );
    let router = sizer_api::create_router(state.clone());

    (router, state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
}

async fn post(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
}

fn reference_workload() -> serde_json::Value {
    serde_json::json!({
        "engine": "postgres",
        "region": "us-east-1",
        "cores": 16,
        "cpu_util_pct": 65,
        "ram_gb": 64,
        "ram_util_pct": 75,
        "storage_gb": 1000,
        "iops": 8000,
        "growth_pct_annual": 15.0,
        "backup_retention_days": 7,
        "data_transfer_gb_month": 100
    })
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app(10).await;
    state
        .health_registry
        .set_degraded(components::CATALOG, "fallback-only entries")
        .await;

    let (status, health) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app(10).await;
    let empty = PricingCatalog::from_base_table("us-east-1", BTreeMap::new(), BTreeMap::new());
    assess_catalog(&state.health_registry, &empty).await;

    let (status, health) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["components"]["catalog"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_tracks_initialization() {
    let (app, state) = setup_test_app(10).await;

    let (status, readiness) = get(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_sizing_returns_all_environments() {
    let (app, _state) = setup_test_app(10).await;

    let (status, analysis) = post(app, "/api/v1/sizing", reference_workload()).await;
    assert_eq!(status, StatusCode::OK);

    let results = analysis["results"].as_array().unwrap();
    let envs: Vec<_> = results.iter().map(|r| r["environment"].as_str().unwrap()).collect();
    assert_eq!(envs, ["PROD", "STAGING", "QA", "DEV"]);
    assert_eq!(results[0]["instance_type"], "db.m5.large");
    assert_eq!(results[0]["storage_gb"], 1719);
    assert_eq!(results[3]["instance_type"], "db.t3.micro");
    assert!((results[0]["monthly_cost"].as_f64().unwrap() - 573.9175).abs() < 1e-6);
}

#[tokio::test]
async fn test_sizing_subset_of_environments() {
    let (app, _state) = setup_test_app(10).await;
    let mut body = reference_workload();
    body["environments"] = serde_json::json!(["DEV"]);

    let (status, analysis) = post(app, "/api/v1/sizing", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analysis["results"].as_array().unwrap().len(), 1);
    assert_eq!(analysis["results"][0]["environment"], "DEV");
}

#[tokio::test]
async fn test_sizing_repeated_environments_counted_once() {
    let (app, _state) = setup_test_app(10).await;
    let mut once = reference_workload();
    once["environments"] = serde_json::json!(["PROD"]);
    let mut twice = reference_workload();
    twice["environments"] = serde_json::json!(["PROD", "PROD"]);

    let (_, single) = post(app.clone(), "/api/v1/sizing", once).await;
    let (status, repeated) = post(app, "/api/v1/sizing", twice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repeated["results"].as_array().unwrap().len(), 1);
    assert_eq!(repeated["total_monthly_cost"], single["total_monthly_cost"]);
    assert_eq!(repeated["total_annual_cost"], single["total_annual_cost"]);
}

#[tokio::test]
async fn test_sizing_rejects_invalid_workload() {
    let (app, _state) = setup_test_app(10).await;
    let mut body = reference_workload();
    body["cpu_util_pct"] = serde_json::json!(140);
    body["backup_retention_days"] = serde_json::json!(90);

    let (status, error) = post(app, "/api/v1/sizing", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "validation_failed");
    assert_eq!(error["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_batch_sizes_every_database() {
    let (app, _state) = setup_test_app(10).await;
    let mut first = reference_workload();
    first["name"] = "orders".into();
    let mut second = reference_workload();
    second["name"] = "billing".into();
    second["engine"] = "aurora-mysql".into();

    let (status, report) = post(
        app,
        "/api/v1/sizing/batch",
        serde_json::json!({ "databases": [first, second] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["databases"][0]["name"], "orders");
    assert_eq!(report["databases"][1]["name"], "billing");
    assert_eq!(report["summary"]["database_count"], 2);
    assert!(report["generated_at"].is_string());
}

#[tokio::test]
async fn test_empty_batch_is_valid() {
    let (app, _state) = setup_test_app(10).await;
    let (status, report) = post(
        app,
        "/api/v1/sizing/batch",
        serde_json::json!({ "databases": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["summary"]["database_count"], 0);
    assert!(report["summary"]["average_prod_optimization_score"].is_null());
}

#[tokio::test]
async fn test_batch_over_limit_is_rejected() {
    let (app, _state) = setup_test_app(1).await;
    let mut db = reference_workload();
    db["name"] = "a".into();

    let (status, error) = post(
        app,
        "/api/v1/sizing/batch",
        serde_json::json!({ "databases": [db.clone(), db] }),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error["error"], "batch_too_large");
}

#[tokio::test]
async fn test_batch_lists_invalid_entries() {
    let (app, _state) = setup_test_app(10).await;
    let mut good = reference_workload();
    good["name"] = "good".into();
    let mut bad = reference_workload();
    bad["name"] = "bad".into();
    bad["storage_gb"] = 0.into();

    let (status, error) = post(
        app,
        "/api/v1/sizing/batch",
        serde_json::json!({ "databases": [good, bad] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let entries = error["details"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["index"], 1);
    assert_eq!(entries[0]["name"], "bad");
    assert_eq!(entries[0]["issues"][0]["field"], "storage_gb");
}

#[tokio::test]
async fn test_batch_rejects_projection_horizon_out_of_range() {
    let (app, _state) = setup_test_app(10).await;
    let mut good = reference_workload();
    good["name"] = "good".into();
    let mut huge = reference_workload();
    huge["name"] = "huge".into();
    huge["projection_years"] = 4_000_000_000u32.into();

    let (status, error) = post(
        app,
        "/api/v1/sizing/batch",
        serde_json::json!({ "databases": [good, huge] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let entries = error["details"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "huge");
    assert_eq!(entries[0]["issues"][0]["kind"], "projection_years");
    assert_eq!(entries[0]["issues"][0]["value"], 4_000_000_000u32);
}

#[tokio::test]
async fn test_batch_annotates_notes() {
    let (app, _state) = setup_test_app(10).await;
    let mut db = reference_workload();
    db["name"] = "orders".into();
    db["projection_years"] = 5.into();
    db["notes"] = "Workload type: OLTP\nRecommendations:\n- Add a read replica".into();

    let (status, report) = post(
        app,
        "/api/v1/sizing/batch",
        serde_json::json!({ "databases": [db] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let database = &report["databases"][0];
    assert_eq!(database["projection"]["years"].as_array().unwrap().len(), 5);
    assert_eq!(database["narrative"]["kind"], "structured");
    assert_eq!(database["narrative"]["workload_type"], "OLTP");
    assert_eq!(database["narrative"]["recommendations"][0], "Add a read replica");
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let (app, _state) = setup_test_app(10).await;

    let (status, regions) = get(app.clone(), "/api/v1/catalog/regions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(regions["base_region"], "us-east-1");
    assert_eq!(regions["regions"].as_array().unwrap().len(), 5);

    let (status, shapes) = get(app.clone(), "/api/v1/catalog/eu-west-1/aurora-mysql").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shapes["exact"], true);
    assert_eq!(shapes["shapes"].as_array().unwrap().len(), 4);

    let (status, shapes) = get(app.clone(), "/api/v1/catalog/mars-north-1/postgres").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shapes["exact"], false);
    assert!(!shapes["shapes"].as_array().unwrap().is_empty());

    let (status, _) = get(app, "/api/v1/catalog/us-east-1/mysql").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insights_endpoint() {
    let (app, _state) = setup_test_app(10).await;
    let (status, annotation) = post(
        app,
        "/api/v1/insights",
        serde_json::json!({ "text": "Workload type: OLAP\nRisks:\n- long cutover" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(annotation["kind"], "structured");
    assert_eq!(annotation["workload_type"], "OLAP");
    assert_eq!(annotation["risks"][0], "long cutover");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_sizing_metrics() {
    let (app, _state) = setup_test_app(10).await;
    let (status, _) = post(app.clone(), "/api/v1/sizing", reference_workload()).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("db_sizer_results_total"));
}
