// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! Reads the text of a single cropped line with greedy CTC decoding.

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::REC_INPUT_HEIGHT;

/// Recognition model input height (PP-OCRv5 English model uses 48)
pub const RECOGNITION_INPUT_HEIGHT: u32 = REC_INPUT_HEIGHT; // 48

/// CTC blank token index
const BLANK_INDEX: usize = 0;

/// Recognized text with confidence score
#[derive(Debug, Clone)]
pub struct RecognizedText {
    pub text: String,
    /// Mean per-character confidence (0.0-1.0)
    pub confidence: f32,
    pub char_confidences: Vec<f32>,
}

impl RecognizedText {
    pub fn new(text: String, confidence: f32) -> Self {
        Self {
            text,
            confidence,
            char_confidences: Vec::new(),
        }
    }

    /// Check if the text is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// PaddleOCR text recognition model
#[derive(Clone)]
pub struct OcrRecognitionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Character dictionary for CTC decoding, blank at index 0
    dictionary: Arc<Vec<char>>,
    input_name: String,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OcrRecognitionModel {
    /// Load the OCR recognition model and its character dictionary
    ///
    /// # Errors
    /// Returns error if either file is missing or the ONNX session fails to build.
    pub async fn new<P: AsRef<Path>>(model_path: P, dict_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        info!(
            "Loading OCR recognition model from {}",
            model_path.display()
        );

        let dictionary = load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

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
                "Failed to load OCR recognition model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        info!("✅ OCR recognition model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize text from a preprocessed `[1, 3, 48, W]` tensor
    ///
    /// With an `allowlist`, only those characters (and the blank) compete at
    /// each timestep, so the decoder never emits anything outside it.
    pub fn recognize(&self, input: &Array4<f32>, allowlist: Option<&str>) -> Result<RecognizedText> {
        let shape = input.shape();
        if shape.len() != 4
            || shape[0] != 1
            || shape[1] != 3
            || shape[2] != RECOGNITION_INPUT_HEIGHT as usize
            || shape[3] < 4
        {
            anyhow::bail!(
                "Invalid input shape: {:?}, expected [1, 3, {}, W>=4]",
                shape,
                RECOGNITION_INPUT_HEIGHT
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognition session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Recognition output shape: {:?}", output_tensor.shape());

        let allowed = allowlist.map(|chars| allowed_classes(&self.dictionary, chars));
        ctc_decode(output_tensor.view(), &self.dictionary, allowed.as_deref())
    }
}

/// Load character dictionary, one character per line
///
/// Index 0 is reserved for the CTC blank; a trailing space class is added
/// when the file does not list one.
fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
    let file = File::open(path.as_ref()).context(format!(
        "Failed to open dictionary: {}",
        path.as_ref().display()
    ))?;

    let reader = BufReader::new(file);
    let mut dictionary = vec![' '];

    for line in reader.lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.chars().next() {
            dictionary.push(ch);
        }
    }

    if !dictionary[1..].contains(&' ') {
        dictionary.push(' ');
    }

    Ok(dictionary)
}

/// Per-class mask: `true` for the blank and every allowlisted character
fn allowed_classes(dictionary: &[char], allowlist: &str) -> Vec<bool> {
    dictionary
        .iter()
        .enumerate()
        .map(|(index, ch)| index == BLANK_INDEX || allowlist.contains(*ch))
        .collect()
}

/// Greedy CTC decoding with blank removal and repeat collapsing
///
/// Accepts `[batch, seq_len, classes]` or `[seq_len, classes]` output.
fn ctc_decode(
    output: ArrayViewD<f32>,
    dictionary: &[char],
    allowed: Option<&[bool]>,
) -> Result<RecognizedText> {
    let output_shape = output.shape();
    let (seq_len, num_classes) = match output_shape.len() {
        3 => (output_shape[1], output_shape[2]),
        2 => (output_shape[0], output_shape[1]),
        _ => anyhow::bail!("Unexpected output shape: {:?}", output_shape),
    };
    let is_3d = output_shape.len() == 3;

    let mut text = String::new();
    let mut char_confidences = Vec::new();
    let mut prev_index: Option<usize> = None;

    for t in 0..seq_len {
        let mut max_prob = f32::NEG_INFINITY;
        let mut max_index = BLANK_INDEX;

        for c in 0..num_classes {
            if let Some(mask) = allowed {
                if !mask.get(c).copied().unwrap_or(false) {
                    continue;
                }
            }

            let prob = if is_3d {
                output[IxDyn(&[0, t, c])]
            } else {
                output[IxDyn(&[t, c])]
            };

            if prob > max_prob {
                max_prob = prob;
                max_index = c;
            }
        }

        if max_index != BLANK_INDEX && Some(max_index) != prev_index {
            if let Some(ch) = dictionary.get(max_index) {
                text.push(*ch);
                char_confidences.push(max_prob);
            }
        }

        prev_index = (max_index != BLANK_INDEX).then_some(max_index);
    }

    let confidence = if char_confidences.is_empty() {
        0.0
    } else {
        let mean = char_confidences.iter().sum::<f32>() / char_confidences.len() as f32;
        // Log-probability outputs are squashed into [0, 1]
        if mean < 0.0 {
            1.0 / (1.0 + (-mean).exp())
        } else {
            mean.min(1.0)
        }
    };

    Ok(RecognizedText {
        text,
        confidence,
        char_confidences,
    })
}
