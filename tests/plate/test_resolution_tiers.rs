// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Full-image tiers and the sentinel fallback

use plate_lookup_node::vision::{PlateResolver, ResolverConfig, Tier, SENTINEL_PLATE};

use super::support::{blank, det, png, ScriptedDetector};

#[test]
fn test_valid_plate_beats_more_confident_invalid_text() {
    let detector = ScriptedDetector::new(vec![Ok(vec![
        det("ABCEFGK", 0.95),
        det("ABC-236", 0.9),
    ])]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&blank()));

    assert_eq!(resolution.plate, "ABC236");
    assert_eq!(resolution.tier, Some(Tier::FullStrict));
    assert_eq!(resolution.confidence, Some(0.9));
    assert_eq!(detector.calls(), 1);
}

#[test]
fn test_full_image_pass_uses_allowlist_and_min_size() {
    let detector = ScriptedDetector::new(vec![Ok(vec![det("ABC236", 0.8)])]);
    let resolver = PlateResolver::new(detector.clone());

    resolver.resolve(&png(&blank()));

    let options = detector.options();
    assert_eq!(options.len(), 1);
    let allowlist = options[0].allowlist.as_deref().unwrap();
    assert!(allowlist.contains('A') && allowlist.contains('9'));
    assert!(!allowlist.contains('-'));
    assert_eq!(options[0].min_size, Some(10));
}

#[test]
fn test_full_image_min_size_follows_config() {
    let detector = ScriptedDetector::new(vec![Ok(vec![det("ABC236", 0.8)])]);
    let config = ResolverConfig {
        full_image_min_size: None,
        ..ResolverConfig::default()
    };
    let resolver = PlateResolver::with_config(detector.clone(), config);

    resolver.resolve(&png(&blank()));

    let options = detector.options();
    assert_eq!(options[0].min_size, None);
    assert!(options[0].allowlist.is_some());
}

#[test]
fn test_relaxed_tier_returns_unvalidated_text() {
    let detector = ScriptedDetector::new(vec![Ok(vec![det("abc ef", 0.7), det("XY", 0.99)])]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&blank()));

    assert_eq!(resolution.plate, "ABCEF");
    assert_eq!(resolution.tier, Some(Tier::FullRelaxed));
}

#[test]
fn test_low_confidence_detections_are_ignored() {
    let detector = ScriptedDetector::new(vec![Ok(vec![det("ABC236", 0.29)])]);
    let resolver = PlateResolver::new(detector);

    assert_eq!(resolver.resolve(&png(&blank())), SENTINEL_PLATE);
}

#[test]
fn test_blank_image_falls_back_with_one_ocr_call() {
    let detector = ScriptedDetector::new(vec![]);
    let resolver = PlateResolver::new(detector.clone());

    let resolution = resolver.resolve_bytes(&png(&blank()));

    assert_eq!(resolution.plate, "AC001");
    assert!(resolution.is_sentinel());
    assert_eq!(detector.calls(), 1);
}

#[test]
fn test_non_image_bytes_give_sentinel() {
    let detector = ScriptedDetector::new(vec![]);
    let resolver = PlateResolver::new(detector.clone());

    assert_eq!(resolver.resolve(b"definitely not an image"), SENTINEL_PLATE);
    assert_eq!(resolver.resolve(&[]), SENTINEL_PLATE);
    assert_eq!(detector.calls(), 0);
}

#[test]
fn test_full_image_error_gives_sentinel() {
    let detector = ScriptedDetector::new(vec![Err(anyhow::anyhow!("session crashed"))]);
    let resolver = PlateResolver::new(detector.clone());

    assert_eq!(resolver.resolve(&png(&blank())), SENTINEL_PLATE);
    assert_eq!(detector.calls(), 1);
}

#[test]
fn test_configured_sentinel() {
    let config = ResolverConfig {
        sentinel: "NOPLATE".to_string(),
        ..ResolverConfig::default()
    };
    let resolver = PlateResolver::with_config(ScriptedDetector::new(vec![]), config);

    assert_eq!(resolver.resolve(&png(&blank())), "NOPLATE");
}
