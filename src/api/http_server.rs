// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::plate::{plate_handler, plate_upload_handler, plate_vehicles_handler};
use super::vehicles::read_vehicles_handler;
use crate::config::ApiConfig;
use crate::storage::{MockVehicleLookup, VehicleLookup};
use crate::vision::{
    ReadinessStatus, ResolverConfig, TextDetector, VisionModelConfig, VisionModelInfo,
    VisionModelManager,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub vision_model_manager: Arc<VisionModelManager>,
    pub vehicle_lookup: Arc<dyn VehicleLookup>,
    pub api_config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        vision_model_manager: VisionModelManager,
        vehicle_lookup: Arc<dyn VehicleLookup>,
        api_config: ApiConfig,
    ) -> Self {
        Self {
            vision_model_manager: Arc::new(vision_model_manager),
            vehicle_lookup,
            api_config: Arc::new(api_config),
        }
    }

    /// State around a ready detector and an in-memory vehicle registry
    pub fn new_for_test(detector: Arc<dyn TextDetector>, vehicles: MockVehicleLookup) -> Self {
        let manager = VisionModelManager::with_detector(
            detector,
            VisionModelConfig::default(),
            ResolverConfig::default(),
        );
        Self::new(manager, Arc::new(vehicles), ApiConfig::default())
    }

    pub fn max_image_bytes(&self) -> usize {
        self.api_config.max_image_bytes
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ocr: ReadinessStatus,
    pub models: Vec<VisionModelInfo>,
    pub version: &'static str,
}

pub fn create_router(state: AppState) -> Router {
    // base64 inflates payloads by a third; leave room for JSON framing
    let body_limit = state.max_image_bytes().saturating_mul(4) / 3 + 64 * 1024;
    let cors = cors_layer(&state.api_config.cors_allowed_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/v1/plate", post(plate_handler))
        .route("/v1/plate/upload", post(plate_upload_handler))
        .route("/v1/plate/vehicles", post(plate_vehicles_handler))
        .route("/api/vehiculos/read/", post(read_vehicles_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn start_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🚀 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "Backend is running!",
        version: "1.0",
    })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let manager = &state.vision_model_manager;
    Json(HealthResponse {
        status: "ok",
        ocr: manager.status(),
        models: manager.list_models(),
        version: crate::version::VERSION,
    })
}
