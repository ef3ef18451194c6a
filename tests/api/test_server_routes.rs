// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /, GET /health and server lifecycle

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use plate_lookup_node::api::{start_server, AppState};
use plate_lookup_node::config::ApiConfig;
use plate_lookup_node::storage::MockVehicleLookup;
use plate_lookup_node::vision::{ResolverConfig, VisionModelConfig, VisionModelManager};
use serde_json::json;

use super::support::{send, state_reading};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_root_reports_running() {
    let (state, _) = state_reading("ABC236");

    let (status, body) = send(state, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "Backend is running!", "version": "1.0"}));
}

#[tokio::test]
async fn test_health_while_loading() {
    let manager = VisionModelManager::new(VisionModelConfig::default(), ResolverConfig::default());
    let state = AppState::new(
        manager,
        Arc::new(MockVehicleLookup::new()),
        ApiConfig::default(),
    );

    let (status, body) = send(state, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["ocr"], "loading");
    assert_eq!(body["models"][0]["name"], "paddleocr");
}

#[tokio::test]
async fn test_health_when_ready() {
    let (state, _) = state_reading("ABC236");

    let (_, body) = send(state, get("/health")).await;

    assert_eq!(body["ocr"], "ready");
}

#[tokio::test]
async fn test_unknown_route() {
    let (state, _) = state_reading("ABC236");

    let (status, _) = send(state, get("/v1/ocr")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_server_shuts_down() {
    let (state, _) = state_reading("ABC236");
    let addr = "127.0.0.1:0".parse().unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        start_server(addr, state, tokio::time::sleep(Duration::from_millis(50))),
    )
    .await;

    assert!(matches!(result, Ok(Ok(()))));
}
