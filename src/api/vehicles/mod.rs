// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vehicle registry endpoint
//!
//! Provides POST /api/vehiculos/read/ for lookups by a known plate.

pub mod handler;
pub mod request;

pub use handler::read_vehicles_handler;
pub use request::ReadVehiclesRequest;
