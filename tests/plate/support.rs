// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scripted OCR engine and synthetic plate images

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use plate_lookup_node::vision::{BoundingBox, DetectOptions, RawDetection, TextDetector};

/// Replays canned responses in call order, then reports no text
pub struct ScriptedDetector {
    responses: Mutex<VecDeque<anyhow::Result<Vec<RawDetection>>>>,
    options: Mutex<Vec<DetectOptions>>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(responses: Vec<anyhow::Result<Vec<RawDetection>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            options: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> Vec<DetectOptions> {
        self.options.lock().unwrap().clone()
    }
}

impl TextDetector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detect(&self, _: &DynamicImage, options: &DetectOptions) -> anyhow::Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn det(text: &str, confidence: f32) -> RawDetection {
    RawDetection::new(
        text,
        confidence,
        BoundingBox {
            x: 0,
            y: 0,
            width: 120,
            height: 40,
        },
    )
}

/// Dark canvas with white plate-shaped boxes at the given top-left corners
pub fn plate_boxes(corners: &[(u32, u32)]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(480, 360, Rgb([20, 20, 20]));
    for &(x0, y0) in corners {
        for y in y0..y0 + 40 {
            for x in x0..x0 + 120 {
                img.put_pixel(x, y, Rgb([240, 240, 240]));
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Uniform image with no edges at all
pub fn blank() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 240, Rgb([128, 128, 128])))
}

pub fn png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
