// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text normalization for raw OCR output

/// Normalize raw OCR text into plate form
///
/// Keeps ASCII letters and digits only, upper-cased. Whitespace, dashes and
/// punctuation are dropped. Empty input yields an empty string.
pub fn normalize_text(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
