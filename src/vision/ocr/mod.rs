// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR integration for text extraction from images
//!
//! CPU-only OCR built on PaddleOCR ONNX models, exposed to the rest of the
//! crate through the [`TextDetector`] trait.
//!
//! Components:
//! - `detection` - Text line detection
//! - `recognition` - CTC text recognition with optional character allowlist
//! - `preprocessing` - Tensor preparation for both models
//! - `model` - Combined pipeline and the `TextDetector` contract

pub mod detection;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use detection::{OcrDetectionModel, TextBox};
pub use model::{BoundingBox, DetectOptions, PaddleOcrModel, RawDetection, TextDetector};
pub use recognition::{OcrRecognitionModel, RecognizedText};
