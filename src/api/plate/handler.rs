// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate endpoint handlers

use std::time::Instant;

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};

use super::request::{PlateRequest, PlateVehiclesRequest};
use super::response::{PlateResponse, PlateVehiclesResponse};
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::vision::{decode_base64_bytes, validate_image_bytes, PlateResolution};

/// Multipart field carrying the image
const UPLOAD_FIELD: &str = "image";

/// POST /v1/plate - Read a license plate from a base64 image
///
/// # Request
/// - `image`: Base64-encoded image data (required)
/// - `format`: Image format hint (optional)
///
/// # Response
/// - `plate`: Plate text, or "AC001" when none was found
/// - `tier`: `full_strict`, `full_relaxed` or `region`; absent for the sentinel
/// - `confidence`, `processingTimeMs`, `sentinel`
///
/// # Errors
/// - 400 Bad Request: missing image, bad base64 or not an image
/// - 503 Service Unavailable: OCR model not ready
pub async fn plate_handler(
    State(state): State<AppState>,
    Json(request): Json<PlateRequest>,
) -> Result<Json<PlateResponse>, ApiErrorResponse> {
    let started = Instant::now();

    request.validate(state.max_image_bytes()).map_err(|e| {
        warn!("Plate validation failed: {}", e);
        e
    })?;
    let encoded = request.image.as_deref().unwrap_or_default();
    let bytes = decode_base64_bytes(encoded, state.max_image_bytes())?;

    let resolution = resolve_plate(&state, bytes).await?;
    Ok(Json(PlateResponse::new(resolution, elapsed_ms(started))))
}

/// POST /v1/plate/upload - Read a license plate from a multipart upload
///
/// The image is taken from the `image` field.
pub async fn plate_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PlateResponse>, ApiErrorResponse> {
    let started = Instant::now();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        image = Some(bytes.to_vec());
        break;
    }

    let bytes = image.ok_or_else(|| ApiError::ValidationError {
        field: UPLOAD_FIELD.to_string(),
        message: "image file is required".to_string(),
    })?;

    let resolution = resolve_plate(&state, bytes).await?;
    Ok(Json(PlateResponse::new(resolution, elapsed_ms(started))))
}

/// POST /v1/plate/vehicles - Read a plate, then look up its vehicle records
///
/// The sentinel plate is looked up like any other; the registry decides
/// what it maps to.
pub async fn plate_vehicles_handler(
    State(state): State<AppState>,
    Json(request): Json<PlateVehiclesRequest>,
) -> Result<Json<PlateVehiclesResponse>, ApiErrorResponse> {
    let started = Instant::now();

    request.validate(state.max_image_bytes())?;
    let encoded = request.image.as_deref().unwrap_or_default();
    let bytes = decode_base64_bytes(encoded, state.max_image_bytes())?;

    let resolution = resolve_plate(&state, bytes).await?;
    let vehicles = state
        .vehicle_lookup
        .lookup(&request.access_type, &resolution.plate)
        .await?;

    info!(
        "Plate {} matched {} vehicle record(s)",
        resolution.plate,
        vehicles.len()
    );

    Ok(Json(PlateVehiclesResponse {
        plate: resolution.plate,
        tier: resolution.tier,
        vehicles,
        processing_time_ms: elapsed_ms(started),
    }))
}

/// Validate `bytes` as an image and resolve it on the blocking pool
async fn resolve_plate(state: &AppState, bytes: Vec<u8>) -> Result<PlateResolution, ApiError> {
    let format = validate_image_bytes(&bytes, state.max_image_bytes())?;
    debug!("Plate image: {:?}, {} bytes", format, bytes.len());

    let resolver = state.vision_model_manager.plate_resolver().await?;

    tokio::task::spawn_blocking(move || resolver.resolve_bytes(&bytes))
        .await
        .map_err(|e| ApiError::InternalError(format!("Plate resolution task failed: {}", e)))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
