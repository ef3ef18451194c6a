// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate format validation

/// Strings shorter than this are never plates
const MIN_PLAUSIBLE_LEN: usize = 5;

/// Accepted plate lengths (dash-free)
const PLATE_LENGTHS: [usize; 2] = [6, 7];

/// Minimum letters a plate must carry
const MIN_LETTERS: usize = 2;

/// Minimum digits a plate must carry
const MIN_DIGITS: usize = 2;

/// Check whether a normalized string has the shape of a plate
///
/// Dashes are ignored. A plate is 6 or 7 characters long with at least two
/// letters and at least two digits, which covers LLL-DDD, LLL-DDDD and
/// DDD-LLL layouts without listing each one.
pub fn is_valid_plate(text: &str) -> bool {
    let compact: Vec<char> = text.chars().filter(|c| *c != '-').collect();

    if compact.len() < MIN_PLAUSIBLE_LEN || !PLATE_LENGTHS.contains(&compact.len()) {
        return false;
    }

    let letters = compact.iter().filter(|c| c.is_ascii_alphabetic()).count();
    let digits = compact.iter().filter(|c| c.is_ascii_digit()).count();

    letters >= MIN_LETTERS && digits >= MIN_DIGITS
}
