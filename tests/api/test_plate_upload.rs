// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/plate/upload

use axum::body::Body;
use axum::http::{Request, StatusCode};

use super::support::{png_bytes, send, state_reading};

const BOUNDARY: &str = "plate-boundary";

fn multipart(field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"plate.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/v1/plate/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_reads_plate() {
    let (state, _) = state_reading("FG6923");

    let (status, body) = send(state, multipart("image", &png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate"], "FG6923");
}

#[tokio::test]
async fn test_upload_without_image_field() {
    let (state, _) = state_reading("FG6923");

    let (status, body) = send(state, multipart("photo", &png_bytes())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "image");
}

#[tokio::test]
async fn test_upload_of_non_image() {
    let (state, _) = state_reading("FG6923");

    let (status, _) = send(state, multipart("image", b"plain text, not pixels")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
