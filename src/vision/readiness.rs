// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Readiness gate for the asynchronously loaded OCR engine
//!
//! The loader task writes exactly one terminal state (ready or failed);
//! request handlers wait on it with a timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::vision::ocr::TextDetector;

/// How long consumers wait for the engine by default
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadinessError {
    #[error("OCR model not ready after {0:?}")]
    Timeout(Duration),

    #[error("OCR model failed to initialize: {0}")]
    InitFailed(String),
}

/// Coarse engine state for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStatus {
    Loading,
    Ready,
    Failed,
}

#[derive(Clone)]
enum ModelState {
    Loading,
    Ready(Arc<dyn TextDetector>),
    Failed(String),
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Loading => f.write_str("Loading"),
            ModelState::Ready(detector) => write!(f, "Ready({})", detector.name()),
            ModelState::Failed(reason) => write!(f, "Failed({})", reason),
        }
    }
}

impl ModelState {
    fn is_terminal(&self) -> bool {
        !matches!(self, ModelState::Loading)
    }
}

/// Single-writer, many-reader readiness signal
///
/// Clones share the same state.
#[derive(Clone)]
pub struct ModelReadinessGate {
    state: Arc<watch::Sender<ModelState>>,
    timeout: Duration,
}

impl fmt::Debug for ModelReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelReadinessGate")
            .field("state", &*self.state.borrow())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ModelReadinessGate {
    fn default() -> Self {
        Self::new(DEFAULT_READY_TIMEOUT)
    }
}

impl ModelReadinessGate {
    /// New gate in the loading state
    pub fn new(timeout: Duration) -> Self {
        let (state, _) = watch::channel(ModelState::Loading);
        Self {
            state: Arc::new(state),
            timeout,
        }
    }

    /// Gate that is already ready, for tests and preloaded engines
    pub fn ready(detector: Arc<dyn TextDetector>) -> Self {
        let gate = Self::default();
        gate.mark_ready(detector);
        gate
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record a loaded engine. Returns `false` if a terminal state was
    /// already recorded.
    pub fn mark_ready(&self, detector: Arc<dyn TextDetector>) -> bool {
        self.settle(ModelState::Ready(detector))
    }

    /// Record an initialization failure. Returns `false` if a terminal state
    /// was already recorded.
    pub fn mark_failed(&self, reason: impl Into<String>) -> bool {
        self.settle(ModelState::Failed(reason.into()))
    }

    fn settle(&self, next: ModelState) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = next.clone();
            true
        });

        if !changed {
            warn!("Ignoring late readiness update {:?}", next);
        }
        changed
    }

    pub fn status(&self) -> ReadinessStatus {
        match &*self.state.borrow() {
            ModelState::Loading => ReadinessStatus::Loading,
            ModelState::Ready(_) => ReadinessStatus::Ready,
            ModelState::Failed(_) => ReadinessStatus::Failed,
        }
    }

    /// Failure reason, if initialization failed
    pub fn failure(&self) -> Option<String> {
        match &*self.state.borrow() {
            ModelState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// The engine if it is ready now, without waiting
    pub fn detector(&self) -> Option<Arc<dyn TextDetector>> {
        match &*self.state.borrow() {
            ModelState::Ready(detector) => Some(detector.clone()),
            _ => None,
        }
    }

    /// Wait for the engine with the gate's configured timeout
    pub async fn wait_ready(&self) -> Result<Arc<dyn TextDetector>, ReadinessError> {
        self.wait_ready_for(self.timeout).await
    }

    /// Wait until the engine is ready or has failed, bounded by `timeout`
    pub async fn wait_ready_for(
        &self,
        timeout: Duration,
    ) -> Result<Arc<dyn TextDetector>, ReadinessError> {
        let mut rx = self.state.subscribe();

        let settled = tokio::time::timeout(timeout, async {
            rx.wait_for(ModelState::is_terminal)
                .await
                .map(|state| (*state).clone())
        })
        .await;

        match settled {
            Ok(Ok(ModelState::Ready(detector))) => Ok(detector),
            Ok(Ok(ModelState::Failed(reason))) => Err(ReadinessError::InitFailed(reason)),
            Ok(Ok(ModelState::Loading)) | Ok(Err(_)) => Err(ReadinessError::InitFailed(
                "readiness channel closed".to_string(),
            )),
            Err(_) => {
                debug!("Timed out after {:?} waiting for OCR model", timeout);
                Err(ReadinessError::Timeout(timeout))
            }
        }
    }
}
