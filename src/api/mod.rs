// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod plate;
pub mod vehicles;

pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use http_server::{create_router, start_server, AppState, HealthResponse, RootResponse};
pub use plate::{PlateRequest, PlateResponse, PlateVehiclesRequest, PlateVehiclesResponse};
pub use vehicles::ReadVehiclesRequest;
