// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate-shaped region proposals from edge contours

use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canny hysteresis thresholds
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// Accepted bounding-rectangle area, in pixels
pub const MIN_REGION_AREA: u32 = 1000;
pub const MAX_REGION_AREA: u32 = 50000;

/// Accepted width / height ratio
pub const MIN_ASPECT_RATIO: f32 = 2.0;
pub const MAX_ASPECT_RATIO: f32 = 5.0;

/// Rectangle likely to contain a plate, in image pixel coordinates
///
/// `x2`/`y2` are exclusive, so width is `x2 - x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProposal {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl RegionProposal {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn area(&self) -> u32 {
        self.width() * self.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height() == 0 {
            return 0.0;
        }
        self.width() as f32 / self.height() as f32
    }

    /// Whether the rectangle has plate-like size and shape
    pub fn is_plate_shaped(&self) -> bool {
        let area = self.area();
        let aspect = self.aspect_ratio();
        self.x2 > self.x1
            && self.y2 > self.y1
            && (MIN_REGION_AREA..=MAX_REGION_AREA).contains(&area)
            && (MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&aspect)
    }

    /// Crop this region out of `image`, clamped to its bounds
    ///
    /// Returns `None` when nothing of the region lies inside the image.
    pub fn crop(&self, image: &DynamicImage) -> Option<DynamicImage> {
        let (width, height) = image.dimensions();
        let x1 = self.x1.min(width);
        let y1 = self.y1.min(height);
        let x2 = self.x2.min(width);
        let y2 = self.y2.min(height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(image.crop_imm(x1, y1, x2 - x1, y2 - y1))
    }
}

/// Propose plate regions in contour-scan order
///
/// Grayscale -> Canny -> contours -> bounding rectangles filtered by area and
/// aspect ratio. Degenerate images give an empty list.
pub fn propose_regions(image: &DynamicImage) -> Vec<RegionProposal> {
    let gray = image.to_luma8();
    propose_regions_gray(&gray)
}

/// [`propose_regions`] for an image that is already grayscale
pub fn propose_regions_gray(gray: &GrayImage) -> Vec<RegionProposal> {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        debug!("Image too small for region proposals: {}x{}", width, height);
        return Vec::new();
    }

    let edges = canny(gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    let contours = find_contours::<u32>(&edges);

    let proposals: Vec<RegionProposal> = contours
        .iter()
        .filter_map(|contour| bounding_rect(contour.points.iter().map(|p| (p.x, p.y))))
        .filter(RegionProposal::is_plate_shaped)
        .collect();

    debug!(
        "Region proposals: {} of {} contours kept",
        proposals.len(),
        contours.len()
    );

    proposals
}

/// Smallest upright rectangle containing all points (exclusive max edges)
fn bounding_rect(points: impl Iterator<Item = (u32, u32)>) -> Option<RegionProposal> {
    points.fold(None, |acc, (x, y)| {
        Some(match acc {
            None => RegionProposal {
                x1: x,
                y1: y,
                x2: x + 1,
                y2: y + 1,
            },
            Some(r) => RegionProposal {
                x1: r.x1.min(x),
                y1: r.y1.min(y),
                x2: r.x2.max(x + 1),
                y2: r.y2.max(y + 1),
            },
        })
    })
}
