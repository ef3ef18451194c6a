// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Vision model manager: background load and resolver hand-out

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use plate_lookup_node::vision::{
    DetectOptions, RawDetection, ReadinessError, ReadinessStatus, ResolverConfig, TextDetector,
    VisionModelConfig, VisionModelManager,
};

// Model directory (downloaded by the model download script)
const OCR_MODEL_DIR: &str = "./models/paddleocr-onnx";

struct Idle;

impl TextDetector for Idle {
    fn name(&self) -> &str {
        "idle"
    }

    fn detect(&self, _: &DynamicImage, _: &DetectOptions) -> anyhow::Result<Vec<RawDetection>> {
        Ok(Vec::new())
    }
}

fn config(dir: &str) -> VisionModelConfig {
    VisionModelConfig {
        ocr_model_dir: dir.to_string(),
        ready_timeout_secs: 2,
    }
}

#[tokio::test]
async fn test_resolver_waits_for_slow_loader() {
    let manager = VisionModelManager::new(config("/unused"), ResolverConfig::default());
    let _load = manager.spawn_load_with(|| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Arc::new(Idle) as Arc<dyn TextDetector>)
    });

    let resolver = manager.plate_resolver().await.unwrap();
    assert_eq!(resolver.config().max_regions, 3);
    assert_eq!(manager.status(), ReadinessStatus::Ready);
}

#[tokio::test]
async fn test_missing_model_directory() {
    let manager = VisionModelManager::new(
        config("/nonexistent/paddleocr-onnx"),
        ResolverConfig::default(),
    );
    manager.spawn_load().await.unwrap();

    let err = manager.plate_resolver().await.unwrap_err();
    assert!(matches!(err, ReadinessError::InitFailed(_)));

    let models = manager.list_models();
    assert_eq!(models[0].status, ReadinessStatus::Failed);
    assert!(models[0].error.is_some());
}

#[tokio::test]
async fn test_resolver_config_is_passed_through() {
    let resolver_config = ResolverConfig {
        sentinel: "NOPLATE".to_string(),
        ..ResolverConfig::default()
    };
    let manager =
        VisionModelManager::with_detector(Arc::new(Idle), config("/unused"), resolver_config);

    let resolver = manager.plate_resolver().await.unwrap();
    assert_eq!(resolver.resolve(b"junk"), "NOPLATE");
}

#[tokio::test]
#[ignore] // Requires the PaddleOCR ONNX models on disk
async fn test_loads_real_paddleocr_models() {
    let manager = VisionModelManager::new(config(OCR_MODEL_DIR), ResolverConfig::default());
    manager.spawn_load().await.unwrap();

    assert_eq!(manager.status(), ReadinessStatus::Ready);
    let resolver = manager.plate_resolver().await.unwrap();

    let blank = DynamicImage::new_rgb8(320, 240);
    assert_eq!(resolver.resolve_image(&blank).plate, "AC001");
}
