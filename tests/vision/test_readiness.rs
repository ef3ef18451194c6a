// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Readiness gate seen from several concurrent waiters

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use plate_lookup_node::api::ApiError;
use plate_lookup_node::vision::{
    DetectOptions, ModelReadinessGate, RawDetection, ReadinessError, ReadinessStatus, TextDetector,
};

struct Idle;

impl TextDetector for Idle {
    fn name(&self) -> &str {
        "idle"
    }

    fn detect(&self, _: &DynamicImage, _: &DetectOptions) -> anyhow::Result<Vec<RawDetection>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_all_waiters_wake_once_ready() {
    let gate = ModelReadinessGate::new(Duration::from_secs(5));

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_ready().await.map(|d| d.name().to_string()) })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(gate.mark_ready(Arc::new(Idle)));

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap(), "idle");
    }
}

#[tokio::test]
async fn test_timeout_maps_to_service_unavailable() {
    let gate = ModelReadinessGate::new(Duration::from_millis(20));

    let err = gate.wait_ready().await.err().unwrap();
    assert!(matches!(err, ReadinessError::Timeout(_)));

    let api: ApiError = err.into();
    assert_eq!(api.status_code(), 503);
    assert!(matches!(api, ApiError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_waiters_after_failure_fail_fast() {
    let gate = ModelReadinessGate::new(Duration::from_secs(30));
    gate.mark_failed("rec_model.onnx not found");

    let started = std::time::Instant::now();
    let err = gate.wait_ready().await.err().unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(matches!(err, ReadinessError::InitFailed(_)));
    assert_eq!(gate.status(), ReadinessStatus::Failed);
}

#[tokio::test]
async fn test_explicit_timeout_overrides_default() {
    let gate = ModelReadinessGate::new(Duration::from_secs(30));

    let err = gate
        .wait_ready_for(Duration::from_millis(10))
        .await
        .err()
        .unwrap();

    assert_eq!(err, ReadinessError::Timeout(Duration::from_millis(10)));
}
