// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vehicle registry storage

pub mod database;
pub mod vehicles;

pub use database::{is_valid_procedure_name, DatabaseConfig, DEFAULT_VEHICLE_PROCEDURE};
pub use vehicles::{
    decode_result_column, rows_from_result, MockVehicleLookup, PgVehicleLookup, ProcedureResult,
    StorageError, VehicleLookup, VehicleQuery,
};
