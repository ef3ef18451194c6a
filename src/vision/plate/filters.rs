// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image filters used to prepare vehicle photos for plate OCR
//!
//! Pipeline: grayscale -> edge-preserving bilateral smoothing -> CLAHE.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter;

/// Bilateral filter neighbourhood diameter
pub const BILATERAL_DIAMETER: u32 = 11;

/// Bilateral filter range sigma (intensity)
pub const BILATERAL_SIGMA_COLOR: f32 = 17.0;

/// Bilateral filter spatial sigma
pub const BILATERAL_SIGMA_SPACE: f32 = 17.0;

/// CLAHE clip limit
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;

/// CLAHE tile grid (tiles per axis)
pub const CLAHE_TILE_GRID: u32 = 8;

const BINS: usize = 256;

/// Full preprocessing used for whole-image OCR
pub fn preprocess_for_plate(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let smoothed = filter::bilateral_filter(
        &gray,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    clahe(&smoothed, CLAHE_CLIP_LIMIT, CLAHE_TILE_GRID)
}

/// Contrast-limited adaptive histogram equalization
///
/// The image is split into `tile_grid` x `tile_grid` tiles. Each tile gets a
/// histogram clipped at `clip_limit` times the average bin height, with the
/// excess spread over all bins. Pixels are mapped by bilinear interpolation
/// between the four nearest tile lookup tables.
pub fn clahe(image: &GrayImage, clip_limit: f32, tile_grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || tile_grid == 0 {
        return image.clone();
    }

    let tile_w = width.div_ceil(tile_grid.min(width));
    let tile_h = height.div_ceil(tile_grid.min(height));
    // Every tile must start inside the image
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts: Vec<[u8; BINS]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        // Position relative to tile centres
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let ty0 = gy.floor().max(0.0) as u32;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wy = (gy - ty0 as f32).clamp(0.0, 1.0);

        for x in 0..width {
            let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let tx0 = gx.floor().max(0.0) as u32;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let wx = (gx - tx0 as f32).clamp(0.0, 1.0);

            let value = image.get_pixel(x, y)[0] as usize;
            let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - wx)
                + lut_at(tx1, ty0)[value] as f32 * wx;
            let bottom = lut_at(tx0, ty1)[value] as f32 * (1.0 - wx)
                + lut_at(tx1, ty1)[value] as f32 * wx;
            let mapped = top * (1.0 - wy) + bottom * wy;

            output.put_pixel(x, y, Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }

    output
}

/// Build the clipped-histogram lookup table for one tile
fn tile_lut(image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; BINS] {
    let mut histogram = [0u32; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let area = ((x1 - x0) * (y1 - y0)).max(1);

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for count in histogram.iter_mut() {
            if *count > limit {
                excess += *count - limit;
                *count = limit;
            }
        }

        let per_bin = excess / BINS as u32;
        let residual = (excess % BINS as u32) as usize;
        for count in histogram.iter_mut() {
            *count += per_bin;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for bin in (0..BINS).step_by(step).take(residual) {
                histogram[bin] += 1;
            }
        }
    }

    let scale = (BINS - 1) as f32 / area as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (bin, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[bin] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
