// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR model wrapper and the text detection contract used by plate resolution

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::detection::OcrDetectionModel;
use super::preprocessing::{preprocess_for_detection, preprocess_for_recognition, PreprocessInfo, OCR_INPUT_SIZE};
use super::recognition::OcrRecognitionModel;

/// Detection model file inside the model directory
pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";

/// Recognition model file inside the model directory
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";

/// Character dictionary file inside the model directory
pub const DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// Axis-aligned bounding box for detected text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Corner points clockwise from top-left
    pub fn corners(&self) -> [[u32; 2]; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            [self.x, self.y],
            [right, self.y],
            [right, bottom],
            [self.x, bottom],
        ]
    }
}

/// A text detection as reported by an OCR engine
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Text as read, before any normalization
    pub text: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Location in the image passed to the engine
    pub bounding_box: BoundingBox,
}

impl RawDetection {
    pub fn new(text: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bounding_box,
        }
    }
}

/// Options for a single detection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectOptions {
    /// Only these characters may be emitted
    pub allowlist: Option<String>,
    /// Ignore text boxes shorter than this many pixels
    pub min_size: Option<u32>,
}

impl DetectOptions {
    pub fn with_allowlist(mut self, allowlist: impl Into<String>) -> Self {
        self.allowlist = Some(allowlist.into());
        self
    }

    /// `None` keeps boxes of every height
    pub fn with_min_size(mut self, min_size: impl Into<Option<u32>>) -> Self {
        self.min_size = min_size.into();
        self
    }
}

/// An OCR capability: text, box and confidence for every text line in an image
///
/// Detections come back in an engine-defined order. Implementations must be
/// shareable across request handlers.
pub trait TextDetector: Send + Sync {
    /// Engine name for logs and responses
    fn name(&self) -> &str;

    /// Detect and read text in `image`
    fn detect(&self, image: &DynamicImage, options: &DetectOptions) -> Result<Vec<RawDetection>>;
}

/// PaddleOCR model for text extraction
///
/// Combines text detection and recognition models for end-to-end OCR.
/// Runs on CPU only.
#[derive(Debug, Clone)]
pub struct PaddleOcrModel {
    detection: OcrDetectionModel,
    recognition: OcrRecognitionModel,
}

impl PaddleOcrModel {
    /// Load PaddleOCR models from the specified directory
    ///
    /// Expected files:
    /// - det_model.onnx (text detection)
    /// - rec_model.onnx (text recognition)
    /// - ppocr_keys_v1.txt (character dictionary)
    pub async fn new(model_dir: &str) -> Result<Self> {
        let dir = Path::new(model_dir);
        if !dir.is_dir() {
            anyhow::bail!("OCR model directory not found: {}", dir.display());
        }

        debug!("Loading PaddleOCR models from {}", model_dir);
        let started = Instant::now();

        let detection = OcrDetectionModel::new(dir.join(DETECTION_MODEL_FILE))
            .await
            .context("Failed to load detection model")?;
        let recognition =
            OcrRecognitionModel::new(dir.join(RECOGNITION_MODEL_FILE), dir.join(DICTIONARY_FILE))
                .await
                .context("Failed to load recognition model")?;

        info!(
            "✅ PaddleOCR pipeline ready in {}ms",
            started.elapsed().as_millis()
        );

        Ok(Self {
            detection,
            recognition,
        })
    }
}

impl TextDetector for PaddleOcrModel {
    fn name(&self) -> &str {
        "paddleocr"
    }

    fn detect(&self, image: &DynamicImage, options: &DetectOptions) -> Result<Vec<RawDetection>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let info = PreprocessInfo::new(image, OCR_INPUT_SIZE);
        let tensor = preprocess_for_detection(image);
        let boxes = self.detection.detect(&tensor)?;

        let mut detections = Vec::with_capacity(boxes.len());
        for text_box in boxes.iter().filter(|b| b.is_valid()) {
            // Map from padded model space back to image space
            let (x0, y0) = info.map_to_original(text_box.x, text_box.y);
            let (x1, y1) =
                info.map_to_original(text_box.x + text_box.width, text_box.y + text_box.height);

            let left = x0.max(0.0).floor() as u32;
            let top = y0.max(0.0).floor() as u32;
            let right = (x1.ceil().max(0.0) as u32).min(width);
            let bottom = (y1.ceil().max(0.0) as u32).min(height);
            if right <= left || bottom <= top {
                continue;
            }

            let bounding_box = BoundingBox {
                x: left,
                y: top,
                width: right - left,
                height: bottom - top,
            };

            if let Some(min_size) = options.min_size {
                if bounding_box.height < min_size {
                    continue;
                }
            }

            let crop = image.crop_imm(left, top, bounding_box.width, bounding_box.height);
            let input = preprocess_for_recognition(&crop);
            let recognized = self
                .recognition
                .recognize(&input, options.allowlist.as_deref())?;

            if recognized.is_empty() {
                continue;
            }

            detections.push(RawDetection {
                text: recognized.text,
                confidence: recognized.confidence,
                bounding_box,
            });
        }

        debug!(
            "PaddleOCR: {} boxes, {} text detections",
            boxes.len(),
            detections.len()
        );

        Ok(detections)
    }
}
