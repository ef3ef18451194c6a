// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate response types

use serde::Serialize;
use serde_json::Value;

use crate::vision::{PlateResolution, Tier};

/// Response from plate resolution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateResponse {
    /// Plate text, or the sentinel when nothing was read
    pub plate: String,
    /// Strategy that produced the plate
    pub tier: Option<Tier>,
    pub confidence: Option<f32>,
    pub processing_time_ms: u64,
    /// True when `plate` is the "no plate" sentinel
    pub sentinel: bool,
}

impl PlateResponse {
    pub fn new(resolution: PlateResolution, processing_time_ms: u64) -> Self {
        let sentinel = resolution.is_sentinel();
        Self {
            plate: resolution.plate,
            tier: resolution.tier,
            confidence: resolution.confidence,
            processing_time_ms,
            sentinel,
        }
    }
}

/// Plate plus the registry records found for it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateVehiclesResponse {
    pub plate: String,
    pub tier: Option<Tier>,
    pub vehicles: Vec<Value>,
    pub processing_time_ms: u64,
}
