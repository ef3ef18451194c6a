// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde_json::Value;
use tracing::{debug, warn};

use super::request::ReadVehiclesRequest;
use crate::api::errors::ApiErrorResponse;
use crate::api::http_server::AppState;

/// POST /api/vehiculos/read/ - Vehicle records for a plate
///
/// Returns the stored procedure's rows as a JSON array.
pub async fn read_vehicles_handler(
    State(state): State<AppState>,
    Json(request): Json<ReadVehiclesRequest>,
) -> Result<Json<Vec<Value>>, ApiErrorResponse> {
    request.validate()?;
    debug!("Vehicle lookup for {} ({})", request.placa, request.access_type);

    let rows = state
        .vehicle_lookup
        .lookup(&request.access_type, &request.placa)
        .await
        .map_err(|e| {
            warn!("Vehicle lookup failed: {}", e);
            e
        })?;

    Ok(Json(rows))
}
