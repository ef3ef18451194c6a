// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-tier plate resolution
//!
//! Turns the raw detections of a [`TextDetector`] into one plate string:
//!
//! 1. `FullStrict` - whole preprocessed image, allowlisted OCR, confident
//!    detections that normalize and correct into a valid plate.
//! 2. `FullRelaxed` - the same detections, any corrected text of length 5+.
//! 3. `Region` - OCR on up to three plate-shaped crops, first valid text wins.
//!
//! When every tier comes up empty the sentinel plate is returned. `resolve`
//! never fails.

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::corrector::correct;
use super::filters::preprocess_for_plate;
use super::normalizer::normalize_text;
use super::regions::propose_regions;
use super::validator::is_valid_plate;
use crate::vision::ocr::{DetectOptions, RawDetection, TextDetector};

/// Returned when no tier produces a candidate
pub const SENTINEL_PLATE: &str = "AC001";

/// Characters the full-image pass may emit
pub const PLATE_ALLOWLIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Resolution tier that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    FullStrict,
    FullRelaxed,
    Region,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::FullStrict => "full_strict",
            Tier::FullRelaxed => "full_relaxed",
            Tier::Region => "region",
        };
        f.write_str(name)
    }
}

/// Normalized and corrected text that survived a tier's filter
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub confidence: f32,
    pub tier: Tier,
}

/// Thresholds and limits of the resolution policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum detection confidence for both full-image tiers
    pub strict_min_confidence: f32,
    /// Minimum detection confidence inside a region crop
    pub region_min_confidence: f32,
    /// Minimum corrected length accepted by the relaxed tier
    pub relaxed_min_len: usize,
    /// Number of region proposals scanned
    pub max_regions: usize,
    /// Minimum text height for the full-image pass
    pub full_image_min_size: Option<u32>,
    pub sentinel: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict_min_confidence: 0.3,
            region_min_confidence: 0.4,
            relaxed_min_len: 5,
            max_regions: 3,
            full_image_min_size: Some(10),
            sentinel: SENTINEL_PLATE.to_string(),
        }
    }
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateResolution {
    /// Validated plate, best-effort text, or the sentinel
    pub plate: String,
    /// `None` when the sentinel was returned
    pub tier: Option<Tier>,
    pub confidence: Option<f32>,
}

impl PlateResolution {
    fn from_candidate(candidate: Candidate) -> Self {
        Self {
            plate: candidate.text,
            tier: Some(candidate.tier),
            confidence: Some(candidate.confidence),
        }
    }

    fn sentinel(plate: &str) -> Self {
        Self {
            plate: plate.to_string(),
            tier: None,
            confidence: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.tier.is_none()
    }
}

/// Runs the tiered resolution policy over a shared OCR engine
#[derive(Clone)]
pub struct PlateResolver {
    detector: Arc<dyn TextDetector>,
    config: ResolverConfig,
}

impl fmt::Debug for PlateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlateResolver")
            .field("detector", &self.detector.name())
            .field("config", &self.config)
            .finish()
    }
}

impl PlateResolver {
    pub fn new(detector: Arc<dyn TextDetector>) -> Self {
        Self::with_config(detector, ResolverConfig::default())
    }

    pub fn with_config(detector: Arc<dyn TextDetector>, config: ResolverConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve encoded image bytes to a plate string (or the sentinel)
    pub fn resolve(&self, image_bytes: &[u8]) -> String {
        self.resolve_bytes(image_bytes).plate
    }

    /// Like [`resolve`](Self::resolve), also reporting the answering tier
    pub fn resolve_bytes(&self, image_bytes: &[u8]) -> PlateResolution {
        match image::load_from_memory(image_bytes) {
            Ok(image) => self.resolve_image(&image),
            Err(e) => {
                warn!("Could not decode image for plate resolution: {}", e);
                self.fallback()
            }
        }
    }

    /// Resolve an already decoded image
    pub fn resolve_image(&self, image: &DynamicImage) -> PlateResolution {
        let processed = DynamicImage::ImageLuma8(preprocess_for_plate(image));

        let options = DetectOptions::default()
            .with_allowlist(PLATE_ALLOWLIST)
            .with_min_size(self.config.full_image_min_size);

        let detections = match self.detector.detect(&processed, &options) {
            Ok(detections) => detections,
            Err(e) => {
                error!("Full-image OCR failed on {}: {:#}", self.detector.name(), e);
                return self.fallback();
            }
        };
        debug!("Full-image OCR returned {} detections", detections.len());

        let strict = strict_candidates(&detections, &self.config);
        debug!("{} candidates: {}", Tier::FullStrict, strict.len());
        if let Some(best) = strict.into_iter().next() {
            return self.answer(best);
        }

        let relaxed = relaxed_candidates(&detections, &self.config);
        debug!("{} candidates: {}", Tier::FullRelaxed, relaxed.len());
        if let Some(best) = relaxed.into_iter().next() {
            return self.answer(best);
        }

        if let Some(found) = self.scan_regions(image, &processed) {
            return self.answer(found);
        }

        self.fallback()
    }

    /// Region tier: proposals come from the original image, crops from the
    /// preprocessed one
    fn scan_regions(&self, original: &DynamicImage, processed: &DynamicImage) -> Option<Candidate> {
        let proposals = propose_regions(original);
        debug!(
            "{} proposals: {} (scanning at most {})",
            Tier::Region,
            proposals.len(),
            self.config.max_regions
        );

        for (index, region) in proposals.iter().take(self.config.max_regions).enumerate() {
            let Some(crop) = region.crop(processed) else {
                debug!("Region {} is empty after clamping, skipping", index);
                continue;
            };

            match self.scan_region(&crop) {
                Ok(Some(candidate)) => return Some(candidate),
                Ok(None) => debug!("Region {} {:?} has no valid plate", index, region),
                Err(e) => warn!("OCR failed on region {} {:?}: {:#}", index, region, e),
            }
        }

        None
    }

    /// First confident detection in engine order whose corrected text is valid
    fn scan_region(&self, crop: &DynamicImage) -> anyhow::Result<Option<Candidate>> {
        let detections = self.detector.detect(crop, &DetectOptions::default())?;

        Ok(detections
            .iter()
            .filter(|d| d.confidence >= self.config.region_min_confidence)
            .map(|d| (corrected_text(d), d.confidence))
            .find(|(text, _)| is_valid_plate(text))
            .map(|(text, confidence)| Candidate {
                text,
                confidence,
                tier: Tier::Region,
            }))
    }

    fn answer(&self, candidate: Candidate) -> PlateResolution {
        info!(
            "🚗 Plate resolved: {} (tier {}, confidence {:.2})",
            candidate.text, candidate.tier, candidate.confidence
        );
        PlateResolution::from_candidate(candidate)
    }

    fn fallback(&self) -> PlateResolution {
        info!("No plate found, returning {}", self.config.sentinel);
        PlateResolution::sentinel(&self.config.sentinel)
    }
}

/// Valid plates among confident detections, best first
///
/// The sort is stable: equal confidences keep engine order.
pub fn strict_candidates(detections: &[RawDetection], config: &ResolverConfig) -> Vec<Candidate> {
    ranked(detections, config, Tier::FullStrict, is_valid_plate)
}

/// Long-enough corrected texts among confident detections, best first
pub fn relaxed_candidates(detections: &[RawDetection], config: &ResolverConfig) -> Vec<Candidate> {
    ranked(detections, config, Tier::FullRelaxed, |text| {
        text.chars().count() >= config.relaxed_min_len
    })
}

fn ranked(
    detections: &[RawDetection],
    config: &ResolverConfig,
    tier: Tier,
    accept: impl Fn(&str) -> bool,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = detections
        .iter()
        .filter(|d| d.confidence >= config.strict_min_confidence)
        .map(|d| Candidate {
            text: corrected_text(d),
            confidence: d.confidence,
            tier,
        })
        .filter(|c| accept(&c.text))
        .collect();

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

fn corrected_text(detection: &RawDetection) -> String {
    correct(&normalize_text(&detection.text))
}
