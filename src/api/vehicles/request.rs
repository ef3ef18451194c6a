// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::plate::request::validate_access_type;

/// Lookup by plate, with the registry's own field names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadVehiclesRequest {
    #[serde(rename = "AC", default)]
    pub access_type: String,
    #[serde(default)]
    pub placa: String,
}

impl ReadVehiclesRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_access_type(&self.access_type)?;
        if self.placa.trim().is_empty() {
            return Err(ApiError::ValidationError {
                field: "placa".to_string(),
                message: "placa is required".to_string(),
            });
        }
        Ok(())
    }
}
