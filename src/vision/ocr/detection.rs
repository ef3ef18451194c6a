// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text detection model
//!
//! Finds text lines in a 640x640 padded image and returns their boxes in that
//! padded coordinate space.

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::OCR_INPUT_SIZE;

/// Expected input size for detection model
pub const DETECTION_INPUT_SIZE: u32 = OCR_INPUT_SIZE; // 640x640

/// Probability above which a map pixel counts as text
pub const DEFAULT_BOX_THRESHOLD: f32 = 0.3;

/// Connected components smaller than this (map pixels) are noise
pub const MIN_COMPONENT_PIXELS: usize = 10;

/// A detected text box with location and confidence
#[derive(Debug, Clone)]
pub struct TextBox {
    /// X coordinate of top-left corner (in preprocessed image space)
    pub x: f32,
    /// Y coordinate of top-left corner (in preprocessed image space)
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean text probability over the component
    pub confidence: f32,
}

impl TextBox {
    /// Check if this text box is valid (reasonable dimensions)
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.confidence > 0.0
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Bounds and probability mass of one connected text component
#[derive(Debug, Clone, Copy)]
struct Component {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
    pixels: usize,
    prob_sum: f32,
}

/// PaddleOCR text detection model
#[derive(Clone)]
pub struct OcrDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    input_name: String,
    box_threshold: f32,
}

impl std::fmt::Debug for OcrDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrDetectionModel")
            .field("input_name", &self.input_name)
            .field("box_threshold", &self.box_threshold)
            .finish_non_exhaustive()
    }
}

impl OcrDetectionModel {
    /// Load the OCR detection model from a file
    ///
    /// # Errors
    /// Returns error if the model file is missing or ONNX Runtime cannot
    /// build a CPU session for it.
    pub async fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR detection model not found: {}", model_path.display());
        }

        info!("Loading OCR detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load OCR detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Detection model loaded - input: {}", input_name);
        info!("✅ OCR detection model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            box_threshold: DEFAULT_BOX_THRESHOLD,
        })
    }

    /// Set the probability threshold for text pixels
    pub fn with_box_threshold(mut self, threshold: f32) -> Self {
        self.box_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn box_threshold(&self) -> f32 {
        self.box_threshold
    }

    /// Run text detection on a preprocessed image tensor
    ///
    /// `input` must be `[1, 3, H, W]` as produced by `preprocess_for_detection()`.
    /// Boxes come back in reading order.
    pub fn detect(&self, input: &Array4<f32>) -> Result<Vec<TextBox>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        let (input_height, input_width) = (shape[2], shape[3]);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let text_boxes = parse_probability_map(
            output_tensor.view(),
            input_height,
            input_width,
            self.box_threshold,
        )?;

        debug!("Detected {} text regions", text_boxes.len());

        Ok(text_boxes)
    }
}

/// Turn a `[1, 1, H, W]` or `[1, H, W]` text probability map into boxes
///
/// Connected components above `threshold` become boxes, scaled to the input
/// tensor size and sorted top-to-bottom then left-to-right.
pub fn parse_probability_map(
    output: ArrayViewD<f32>,
    input_height: usize,
    input_width: usize,
    threshold: f32,
) -> Result<Vec<TextBox>> {
    let output_shape = output.shape();
    let (prob_height, prob_width) = match output_shape.len() {
        4 => (output_shape[2], output_shape[3]),
        3 => (output_shape[1], output_shape[2]),
        _ => anyhow::bail!("Unexpected output shape: {:?}", output_shape),
    };

    if prob_height == 0 || prob_width == 0 {
        return Ok(Vec::new());
    }

    let is_4d = output_shape.len() == 4;
    let prob_at = |x: usize, y: usize| {
        if is_4d {
            output[IxDyn(&[0, 0, y, x])]
        } else {
            output[IxDyn(&[0, y, x])]
        }
    };

    let scale_y = input_height as f32 / prob_height as f32;
    let scale_x = input_width as f32 / prob_width as f32;

    let mut visited = vec![vec![false; prob_width]; prob_height];
    let mut text_boxes = Vec::new();

    for y in 0..prob_height {
        for x in 0..prob_width {
            if visited[y][x] || prob_at(x, y) < threshold {
                continue;
            }

            let component = flood_fill(&prob_at, &mut visited, x, y, prob_width, prob_height, threshold);
            if component.pixels <= MIN_COMPONENT_PIXELS {
                continue;
            }

            text_boxes.push(TextBox {
                x: component.min_x as f32 * scale_x,
                y: component.min_y as f32 * scale_y,
                width: (component.max_x - component.min_x + 1) as f32 * scale_x,
                height: (component.max_y - component.min_y + 1) as f32 * scale_y,
                confidence: component.prob_sum / component.pixels as f32,
            });
        }
    }

    text_boxes.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    Ok(text_boxes)
}

/// 4-connected flood fill over pixels at or above `threshold`
fn flood_fill(
    prob_at: &impl Fn(usize, usize) -> f32,
    visited: &mut [Vec<bool>],
    start_x: usize,
    start_y: usize,
    width: usize,
    height: usize,
    threshold: f32,
) -> Component {
    let mut stack = vec![(start_x, start_y)];
    let mut component = Component {
        min_x: start_x,
        max_x: start_x,
        min_y: start_y,
        max_y: start_y,
        pixels: 0,
        prob_sum: 0.0,
    };

    while let Some((x, y)) = stack.pop() {
        if x >= width || y >= height || visited[y][x] {
            continue;
        }

        let prob = prob_at(x, y);
        if prob < threshold {
            continue;
        }

        visited[y][x] = true;
        component.pixels += 1;
        component.prob_sum += prob;
        component.min_x = component.min_x.min(x);
        component.max_x = component.max_x.max(x);
        component.min_y = component.min_y.min(y);
        component.max_y = component.max_y.max(y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }

    component
}
