// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for license plate lookup
//!
//! This module provides:
//! - OCR (Optical Character Recognition) via PaddleOCR
//! - Plate resolution over any OCR engine
//! - A readiness gate for the background-loaded engine
//!
//! Everything runs on CPU.

pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod plate;
pub mod readiness;

pub use image_utils::{
    decode_base64_bytes, decode_base64_image, decode_image_bytes, detect_format,
    validate_image_bytes, ImageError, ImageInfo, DEFAULT_MAX_IMAGE_BYTES,
};
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
pub use ocr::{BoundingBox, DetectOptions, PaddleOcrModel, RawDetection, TextDetector};
pub use plate::{PlateResolution, PlateResolver, ResolverConfig, Tier, SENTINEL_PLATE};
pub use readiness::{ModelReadinessGate, ReadinessError, ReadinessStatus};
