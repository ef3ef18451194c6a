// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router harness with a scripted OCR engine and an in-memory registry

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use plate_lookup_node::api::{create_router, AppState};
use plate_lookup_node::storage::MockVehicleLookup;
use plate_lookup_node::vision::{BoundingBox, DetectOptions, RawDetection, TextDetector};
use serde_json::Value;
use tower::ServiceExt;

/// Answers every full-image pass with the same detections
pub struct FixedDetector(pub Vec<RawDetection>);

impl TextDetector for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    fn detect(&self, _: &DynamicImage, _: &DetectOptions) -> anyhow::Result<Vec<RawDetection>> {
        Ok(self.0.clone())
    }
}

pub fn reads(text: &str, confidence: f32) -> Arc<FixedDetector> {
    Arc::new(FixedDetector(vec![RawDetection::new(
        text,
        confidence,
        BoundingBox {
            x: 10,
            y: 10,
            width: 120,
            height: 40,
        },
    )]))
}

pub fn state_reading(text: &str) -> (AppState, MockVehicleLookup) {
    let vehicles = MockVehicleLookup::new();
    let state = AppState::new_for_test(reads(text, 0.9), vehicles.clone());
    (state, vehicles)
}

pub fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([128, 128, 128])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn png_base64() -> String {
    base64::engine::general_purpose::STANDARD.encode(png_bytes())
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response<Body> = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
