// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// Largest accepted access type code
const MAX_ACCESS_TYPE_LEN: usize = 32;

fn validate_image_field(image: &Option<String>, max_image_bytes: usize) -> Result<(), ApiError> {
    let image = image.as_deref().unwrap_or_default();
    if image.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: "image".to_string(),
            message: "image is required".to_string(),
        });
    }

    // base64 payloads are a third larger than the image itself
    let encoded_limit = max_image_bytes.saturating_mul(4) / 3 + 4;
    if image.len() > encoded_limit {
        return Err(ApiError::ValidationError {
            field: "image".to_string(),
            message: format!("image exceeds maximum size of {} bytes", max_image_bytes),
        });
    }
    Ok(())
}

pub(crate) fn validate_access_type(access_type: &str) -> Result<(), ApiError> {
    if access_type.trim().is_empty() {
        return Err(ApiError::ValidationError {
            field: "AC".to_string(),
            message: "AC is required".to_string(),
        });
    }
    if access_type.len() > MAX_ACCESS_TYPE_LEN {
        return Err(ApiError::ValidationError {
            field: "AC".to_string(),
            message: format!("AC must be at most {} characters", MAX_ACCESS_TYPE_LEN),
        });
    }
    Ok(())
}

/// Request to read a plate from an image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateRequest {
    /// Base64-encoded image data, optionally as a data URL
    #[serde(default)]
    pub image: Option<String>,

    /// Image format hint; the format is always sniffed from the bytes
    #[serde(default)]
    pub format: Option<String>,
}

impl PlateRequest {
    pub fn validate(&self, max_image_bytes: usize) -> Result<(), ApiError> {
        validate_image_field(&self.image, max_image_bytes)?;

        if let Some(format) = &self.format {
            if !SUPPORTED_FORMATS.contains(&format.to_lowercase().as_str()) {
                return Err(ApiError::ValidationError {
                    field: "format".to_string(),
                    message: format!(
                        "unsupported format '{}', supported: {:?}",
                        format, SUPPORTED_FORMATS
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Request to read a plate and look up its vehicle records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlateVehiclesRequest {
    #[serde(default)]
    pub image: Option<String>,

    /// Access type passed through to the registry
    #[serde(rename = "AC", default)]
    pub access_type: String,
}

impl PlateVehiclesRequest {
    pub fn validate(&self, max_image_bytes: usize) -> Result<(), ApiError> {
        validate_image_field(&self.image, max_image_bytes)?;
        validate_access_type(&self.access_type)
    }
}
