// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod storage;
pub mod version;
pub mod vision;

pub use config::{ApiConfig, NodeConfig};
pub use storage::{PgVehicleLookup, StorageError, VehicleLookup};
pub use vision::{PlateResolution, PlateResolver, VisionModelManager, SENTINEL_PLATE};
