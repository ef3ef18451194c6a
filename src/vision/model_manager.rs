// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager: background OCR loading and resolver access

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::vision::ocr::{PaddleOcrModel, TextDetector};
use crate::vision::plate::{PlateResolver, ResolverConfig};
use crate::vision::readiness::{ModelReadinessGate, ReadinessError, ReadinessStatus};

/// Configuration for loading vision models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionModelConfig {
    /// Path to the PaddleOCR model directory
    pub ocr_model_dir: String,
    /// Seconds a request waits for the OCR model before giving up
    pub ready_timeout_secs: u64,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            ocr_model_dir: "./models/paddleocr-onnx".to_string(),
            ready_timeout_secs: 120,
        }
    }
}

impl VisionModelConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

/// Information about a vision model, as reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct VisionModelInfo {
    pub name: String,
    /// Model type (ocr)
    pub model_type: String,
    pub status: ReadinessStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Owns the OCR engine lifecycle
///
/// The engine is loaded once on a background task; handlers obtain a
/// [`PlateResolver`] once it is ready. CPU only.
#[derive(Debug, Clone)]
pub struct VisionModelManager {
    config: VisionModelConfig,
    resolver_config: ResolverConfig,
    gate: ModelReadinessGate,
}

impl VisionModelManager {
    /// Manager in the loading state; call [`spawn_load`](Self::spawn_load) to start
    pub fn new(config: VisionModelConfig, resolver_config: ResolverConfig) -> Self {
        let gate = ModelReadinessGate::new(config.ready_timeout());
        Self {
            config,
            resolver_config,
            gate,
        }
    }

    /// Manager around an engine that is already loaded
    pub fn with_detector(
        detector: Arc<dyn TextDetector>,
        config: VisionModelConfig,
        resolver_config: ResolverConfig,
    ) -> Self {
        let manager = Self::new(config, resolver_config);
        manager.gate.mark_ready(detector);
        manager
    }

    pub fn config(&self) -> &VisionModelConfig {
        &self.config
    }

    pub fn gate(&self) -> &ModelReadinessGate {
        &self.gate
    }

    pub fn status(&self) -> ReadinessStatus {
        self.gate.status()
    }

    /// Load PaddleOCR from the configured directory in the background
    pub fn spawn_load(&self) -> JoinHandle<()> {
        let dir = self.config.ocr_model_dir.clone();
        self.spawn_load_with(move || async move {
            let model = PaddleOcrModel::new(&dir).await?;
            Ok(Arc::new(model) as Arc<dyn TextDetector>)
        })
    }

    /// Run `loader` on a background task and record its outcome in the gate
    pub fn spawn_load_with<F, Fut>(&self, loader: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Arc<dyn TextDetector>>> + Send + 'static,
    {
        let gate = self.gate.clone();
        let dir = self.config.ocr_model_dir.clone();

        tokio::spawn(async move {
            tracing::info!("Loading OCR model from {}", dir);
            // A panicking loader must still settle the gate
            match tokio::spawn(loader()).await {
                Ok(Ok(detector)) => {
                    tracing::info!("✅ OCR engine '{}' ready", detector.name());
                    gate.mark_ready(detector);
                }
                Ok(Err(e)) => {
                    tracing::error!("❌ Failed to load OCR model from {}: {:#}", dir, e);
                    gate.mark_failed(format!("{:#}", e));
                }
                Err(e) => {
                    tracing::error!("❌ OCR model loader aborted: {}", e);
                    gate.mark_failed(format!("OCR model loader aborted: {}", e));
                }
            }
        })
    }

    /// Wait for the engine and build a resolver around it
    pub async fn plate_resolver(&self) -> Result<PlateResolver, ReadinessError> {
        let detector = self.gate.wait_ready().await?;
        Ok(PlateResolver::with_config(
            detector,
            self.resolver_config.clone(),
        ))
    }

    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![VisionModelInfo {
            name: "paddleocr".to_string(),
            model_type: "ocr".to_string(),
            status: self.gate.status(),
            error: self.gate.failure(),
        }]
    }
}
