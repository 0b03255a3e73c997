//! Integration tests for the HTTP API feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use energy_map::api::{AppState, router};
use energy_map::dashboard::load_session;

/// Loads the sample fixtures and returns the API state.
fn build_api_state() -> Arc<AppState> {
    let config = common::sample_config();
    let session = load_session(&config, &common::sample_csv()).expect("sample loads");
    Arc::new(AppState {
        session,
        style: config.map_style(),
    })
}

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn options_endpoint_resolves_defaults() {
    let (status, json) = get_json("/options").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["options"]["power_tiers"], serde_json::json!(["3kW", "6kW"]));
    assert_eq!(json["selection"]["tariff"], "D2");
}

#[tokio::test]
async fn aggregate_endpoint_matches_pipeline() {
    let (status, json) =
        get_json("/aggregate?power_tier=3kW&tariff=TD&residency=Residente").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 184.5);
    assert_eq!(json["total_formatted"], "184.50");
    let regions = json["regions"].as_array().unwrap();
    let names: Vec<_> = regions.iter().map(|r| r["region"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Atlantide", "Lazio", "Lombardia"]);
}

#[tokio::test]
async fn unknown_residency_returns_400() {
    let (status, json) =
        get_json("/aggregate?power_tier=3kW&tariff=TD&residency=Altro").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Altro"));
}

#[tokio::test]
async fn map_endpoint_serves_svg() {
    let app = router(build_api_state());
    let req = Request::builder()
        .uri("/map.svg?tariff=TD")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/svg+xml");
}
