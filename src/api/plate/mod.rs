// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate API endpoint module
//!
//! Provides POST /v1/plate, /v1/plate/upload and /v1/plate/vehicles.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{plate_handler, plate_upload_handler, plate_vehicles_handler};
pub use request::{PlateRequest, PlateVehiclesRequest};
pub use response::{PlateResponse, PlateVehiclesResponse};
