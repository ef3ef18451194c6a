// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/vehiculos/read/ and POST /v1/plate/vehicles

use axum::http::StatusCode;
use plate_lookup_node::storage::StorageError;
use serde_json::json;

use super::support::{png_base64, post_json, send, state_reading};

#[tokio::test]
async fn test_read_vehicles_by_plate() {
    let (state, vehicles) = state_reading("ABC236");
    vehicles
        .insert("ABC236", vec![json!({"placa": "ABC236", "marca": "Seat"})])
        .await;

    let (status, body) = send(
        state,
        post_json("/api/vehiculos/read/", json!({"AC": "residente", "placa": "abc-236"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"placa": "ABC236", "marca": "Seat"}]));

    let calls = vehicles.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].access_type, "residente");
    assert_eq!(calls[0].placa, "ABC236");
}

#[tokio::test]
async fn test_unknown_plate_is_empty_list() {
    let (state, _) = state_reading("ABC236");

    let (status, body) = send(
        state,
        post_json("/api/vehiculos/read/", json!({"AC": "visitante", "placa": "CE3692"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_missing_access_type() {
    let (state, _) = state_reading("ABC236");

    let (status, body) =
        send(state, post_json("/api/vehiculos/read/", json!({"placa": "ABC236"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "AC");
}

#[tokio::test]
async fn test_database_down_is_service_unavailable() {
    let (state, vehicles) = state_reading("ABC236");
    vehicles
        .inject_error(StorageError::Unavailable("connection refused".to_string()))
        .await;

    let (status, body) = send(
        state,
        post_json("/api/vehiculos/read/", json!({"AC": "residente", "placa": "ABC236"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_type"], "storage_unavailable");
}

#[tokio::test]
async fn test_plate_image_to_vehicles() {
    let (state, vehicles) = state_reading("AB-2369");
    vehicles
        .insert("AB2369", vec![json!({"propietario": "Garcia"})])
        .await;

    let (status, body) = send(
        state,
        post_json("/v1/plate/vehicles", json!({"image": png_base64(), "AC": "residente"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate"], "AB2369");
    assert_eq!(body["tier"], "full_strict");
    assert_eq!(body["vehicles"], json!([{"propietario": "Garcia"}]));
}

#[tokio::test]
async fn test_sentinel_plate_is_looked_up() {
    let (state, vehicles) = state_reading("XY");

    let (status, body) = send(
        state,
        post_json("/v1/plate/vehicles", json!({"image": png_base64(), "AC": "visitante"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate"], "AC001");
    assert_eq!(vehicles.calls().await[0].placa, "AC001");
}
