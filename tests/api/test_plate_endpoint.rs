// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/plate

use std::time::Duration;

use axum::http::StatusCode;
use plate_lookup_node::api::{plate::plate_handler, AppState, PlateRequest};
use plate_lookup_node::config::ApiConfig;
use plate_lookup_node::storage::MockVehicleLookup;
use plate_lookup_node::vision::{ResolverConfig, VisionModelConfig, VisionModelManager};
use serde_json::json;
use std::sync::Arc;

use super::support::{png_base64, post_json, send, state_reading};

#[tokio::test]
async fn test_reads_plate_from_base64_image() {
    let (state, _) = state_reading("ABC-236");

    let (status, body) = send(state, post_json("/v1/plate", json!({"image": png_base64()}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate"], "ABC236");
    assert_eq!(body["tier"], "full_strict");
    assert_eq!(body["sentinel"], false);
    assert!(body["processingTimeMs"].is_u64());
}

#[tokio::test]
async fn test_data_url_prefix_is_accepted() {
    let (state, _) = state_reading("ABC236");
    let image = format!("data:image/png;base64,{}", png_base64());

    let (status, body) = send(state, post_json("/v1/plate", json!({"image": image}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate"], "ABC236");
}

#[tokio::test]
async fn test_unreadable_image_returns_sentinel() {
    let (state, _) = state_reading("XY");

    let (status, body) = send(state, post_json("/v1/plate", json!({"image": png_base64()}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate"], "AC001");
    assert_eq!(body["sentinel"], true);
    assert!(body["tier"].is_null());
}

#[tokio::test]
async fn test_missing_image_is_bad_request() {
    let (state, _) = state_reading("ABC236");

    let (status, body) = send(state, post_json("/v1/plate", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_invalid_base64_is_bad_request() {
    let (state, _) = state_reading("ABC236");

    let (status, body) =
        send(state, post_json("/v1/plate", json!({"image": "not base64 !!!"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_non_image_payload_is_bad_request() {
    let (state, _) = state_reading("ABC236");
    let text = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, "hello");

    let (status, _) = send(state, post_json("/v1/plate", json!({"image": text}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_model_not_ready_is_service_unavailable() {
    let manager = VisionModelManager::new(
        VisionModelConfig {
            ocr_model_dir: "/nonexistent".to_string(),
            ready_timeout_secs: 1,
        },
        ResolverConfig::default(),
    );
    let state = AppState::new(
        manager,
        Arc::new(MockVehicleLookup::new()),
        ApiConfig::default(),
    );

    let started = std::time::Instant::now();
    let (status, body) = send(state, post_json("/v1/plate", json!({"image": png_base64()}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_type"], "service_unavailable");
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_failed_model_load_is_service_unavailable() {
    let manager = VisionModelManager::new(VisionModelConfig::default(), ResolverConfig::default());
    manager.gate().mark_failed("det_model.onnx not found");
    let state = AppState::new(
        manager,
        Arc::new(MockVehicleLookup::new()),
        ApiConfig::default(),
    );

    let (status, body) = send(state, post_json("/v1/plate", json!({"image": png_base64()}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_handler_called_directly() {
    let (state, _) = state_reading("CE3692");
    let request = PlateRequest {
        image: Some(png_base64()),
        format: Some("png".to_string()),
    };

    let response = plate_handler(axum::extract::State(state), axum::Json(request))
        .await
        .unwrap();

    assert_eq!(response.0.plate, "CE3692");
}
