// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! License plate resolution
//!
//! Components, leaves first:
//! - `normalizer` - strips everything but ASCII alphanumerics
//! - `validator` - plate shape check
//! - `corrector` - weighted single-rule OCR confusion correction
//! - `filters` - grayscale, bilateral smoothing and CLAHE
//! - `regions` - plate-shaped region proposals from edge contours
//! - `resolver` - the tiered strategy tying it all together

pub mod corrector;
pub mod filters;
pub mod normalizer;
pub mod regions;
pub mod resolver;
pub mod validator;

pub use corrector::{correct, ConfusionRule, CONFUSION_RULES};
pub use filters::preprocess_for_plate;
pub use normalizer::normalize_text;
pub use regions::{propose_regions, RegionProposal};
pub use resolver::{
    Candidate, PlateResolution, PlateResolver, ResolverConfig, Tier, PLATE_ALLOWLIST,
    SENTINEL_PLATE,
};
pub use validator::is_valid_plate;
