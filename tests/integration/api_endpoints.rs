//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - All REST endpoints return correct responses over real HTTP
//! - Authentication middleware functions properly
//! - Error responses carry a JSON body

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gridspace::{
    actors::PersistenceHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    space::EnergySpace,
    storage::memory::MemoryBackend,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::*;

const TOKEN: &str = "test-token";

// Helper to create test API server
async fn spawn_test_api() -> (SocketAddr, EnergySpace, PersistenceHandle) {
    let (_store, space) = create_test_space();
    let history = Arc::new(MemoryBackend::new());
    let persistence = PersistenceHandle::spawn(
        create_persister(&space, history.clone(), 100),
        Duration::from_secs(3600),
    );

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        auth_token: Some(TOKEN.to_string()),
        enable_cors: true,
    };

    let state = ApiState::new(space.clone(), persistence.clone(), history);
    let addr = spawn_api_server(config, state).await.unwrap();
    (addr, space, persistence)
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_health_endpoint_needs_no_token() {
    let (addr, _, _) = spawn_test_api().await;

    let response = client()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "UP");
    assert_eq!(json["arch"], "space-based");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_post_then_list_alerts() {
    let (addr, _, _) = spawn_test_api().await;

    let response = client()
        .post(format!("http://{addr}/price-updates"))
        .bearer_auth(TOKEN)
        .json(&json!([
            {"nodeId": "NODE-001", "priceMwh": 100, "timestampMs": 1_000},
            {"nodeId": "NODE-001", "priceMwh": 250, "timestampMs": 2_000}
        ]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["accepted"], 2);
    assert_eq!(json["alertsRaised"], 1);
    assert_eq!(json["alerts"][0]["alertId"], "NODE-001:SPIKE:2000");

    let alerts: Value = client()
        .get(format!("http://{addr}/active-alerts"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["type"], "SPIKE");
    assert_eq!(alerts[0]["ttlSeconds"], 300);
}

#[tokio::test]
async fn test_empty_batch_returns_400() {
    let (addr, _, _) = spawn_test_api().await;

    let response = client()
        .post(format!("http://{addr}/price-updates"))
        .bearer_auth(TOKEN)
        .json(&json!([]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_active_alerts_empty_list() {
    let (addr, _, _) = spawn_test_api().await;

    let body = client()
        .get(format!("http://{addr}/active-alerts"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_node_endpoint() {
    let (addr, space, _) = spawn_test_api().await;
    space
        .write_price_updates(&[price("N7", 100, 1_000), price("N7", 120, 2_000)])
        .await
        .unwrap();

    let json: Value = client()
        .get(format!("http://{addr}/nodes/N7"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["nodeId"], "N7");
    assert_eq!(json["latestPriceMwh"], "120");
    assert_eq!(json["window"].as_array().unwrap().len(), 2);
    assert!(json["activeAlerts"].as_array().unwrap().is_empty());

    let response = client()
        .get(format!("http://{addr}/nodes/UNKNOWN"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_endpoint_reports_persistence() {
    let (addr, space, persistence) = spawn_test_api().await;
    space
        .write_price_updates(&[price("N1", 100, 1_000), price("N1", 900, 2_000)])
        .await
        .unwrap();
    persistence.run_now().await.unwrap();

    let json: Value = client()
        .get(format!("http://{addr}/stats"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["persistence"]["persisted"], 1);
    assert_eq!(json["history"]["healthy"], true);
    assert_eq!(json["history"]["total_alerts"], 1);
}

#[tokio::test]
async fn test_auth_required() {
    let (addr, _, _) = spawn_test_api().await;

    let response = client()
        .get(format!("http://{addr}/active-alerts"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client()
        .get(format!("http://{addr}/active-alerts"))
        .bearer_auth("wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
