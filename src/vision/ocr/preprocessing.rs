// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tensor preparation for the PaddleOCR models
//!
//! Plate crops arrive as grayscale or RGB; both are expanded to 3-channel NCHW
//! tensors normalized with ImageNet statistics.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Square input side of the detection model
pub const OCR_INPUT_SIZE: u32 = 640;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Minimum recognition width; the CTC head needs a few timesteps
pub const REC_MIN_WIDTH: u32 = 4;

/// Gray used to pad the detection canvas
const PAD_VALUE: u8 = 128;

pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Letterbox `image` into a 640x640 `[1, 3, 640, 640]` tensor
///
/// Use [`PreprocessInfo`] with the same image to map boxes back.
pub fn preprocess_for_detection(image: &DynamicImage) -> Array4<f32> {
    let padded = resize_with_padding(image, OCR_INPUT_SIZE).to_rgb8();
    to_normalized_tensor(&padded)
}

/// Scale a cropped text line to height 48, keeping aspect ratio
///
/// Width is clamped to `REC_MIN_WIDTH..=REC_MAX_WIDTH`; no padding is added.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();
    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32).clamp(REC_MIN_WIDTH, REC_MAX_WIDTH);

    let resized = image
        .resize_exact(
            new_width,
            REC_INPUT_HEIGHT,
            image::imageops::FilterType::Lanczos3,
        )
        .to_rgb8();
    to_normalized_tensor(&resized)
}

/// NCHW tensor of `(pixel / 255 - mean) / std`
fn to_normalized_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    tensor
}

/// Fit `image` inside a `target_size` square, centred on a gray canvas
pub fn resize_with_padding(image: &DynamicImage, target_size: u32) -> DynamicImage {
    let info = PreprocessInfo::new(image, target_size);
    let mut canvas = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );

    if info.original_width == 0 || info.original_height == 0 {
        return DynamicImage::ImageRgb8(canvas);
    }

    let resized = image
        .resize_exact(
            info.scaled_width,
            info.scaled_height,
            image::imageops::FilterType::Lanczos3,
        )
        .to_rgb8();

    image::imageops::replace(
        &mut canvas,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );

    DynamicImage::ImageRgb8(canvas)
}

/// Letterbox geometry for mapping detection boxes back to the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (orig_w, orig_h) = image.dimensions();

        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                scaled_width: 0,
                scaled_height: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let scaled_width = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
            scaled_width,
            scaled_height,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    /// Map a point from model space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.offset_x as f32) / self.scale,
            (y - self.offset_y as f32) / self.scale,
        )
    }
}
