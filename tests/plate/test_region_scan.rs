// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Region tier: proposals are scanned in order, failures are skipped

use plate_lookup_node::vision::plate::propose_regions;
use plate_lookup_node::vision::{PlateResolver, ResolverConfig, Tier, SENTINEL_PLATE};

use super::support::{det, plate_boxes, png, ScriptedDetector};

const BOXES: &[(u32, u32)] = &[(30, 30), (300, 30), (30, 200), (300, 200)];

#[test]
fn test_synthetic_boxes_yield_several_proposals() {
    assert!(propose_regions(&plate_boxes(BOXES)).len() >= 4);
}

#[test]
fn test_error_in_first_region_moves_to_second() {
    let detector = ScriptedDetector::new(vec![
        Ok(vec![]),
        Err(anyhow::anyhow!("crop too small")),
        Ok(vec![det("CE3692", 0.8)]),
    ]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&plate_boxes(BOXES)));

    assert_eq!(resolution.plate, "CE3692");
    assert_eq!(resolution.tier, Some(Tier::Region));
    assert_eq!(detector.calls(), 3);
}

#[test]
fn test_region_without_valid_text_is_skipped() {
    let detector = ScriptedDetector::new(vec![
        Ok(vec![]),
        Ok(vec![det("XY", 0.99), det("FG6923", 0.3)]),
        Ok(vec![det("ABCEFGK", 0.9), det("FG6923", 0.6), det("AB2369", 0.95)]),
    ]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&plate_boxes(BOXES)));

    // first valid detection in engine order, not the most confident one
    assert_eq!(resolution.plate, "FG6923");
    assert_eq!(resolution.confidence, Some(0.6));
}

#[test]
fn test_at_most_three_regions_are_scanned() {
    let detector = ScriptedDetector::new(vec![]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&plate_boxes(BOXES)));

    assert_eq!(resolution.plate, SENTINEL_PLATE);
    assert_eq!(detector.calls(), 1 + 3);
}

#[test]
fn test_region_limit_is_configurable() {
    let config = ResolverConfig {
        max_regions: 1,
        ..ResolverConfig::default()
    };
    let detector = ScriptedDetector::new(vec![]);
    let resolver = PlateResolver::with_config(detector.clone(), config);

    resolver.resolve(&png(&plate_boxes(BOXES)));
    assert_eq!(detector.calls(), 2);
}

#[test]
fn test_regions_are_not_scanned_after_full_image_answer() {
    let detector = ScriptedDetector::new(vec![Ok(vec![det("AB2369", 0.5)])]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&plate_boxes(BOXES)));

    assert_eq!(resolution.tier, Some(Tier::FullStrict));
    assert_eq!(detector.calls(), 1);
}
