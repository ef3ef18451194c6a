// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Weighted character-confusion correction
//!
//! OCR engines misread a handful of glyph pairs on plates far more often than
//! others ("N" read as "H", "A" read as "4", ...). The corrector tries each
//! known confusion against the whole string and keeps the single substitution
//! with the best score. Rules are never combined: a string holding two
//! different confusable characters only ever gets one of them rewritten.

use super::validator::is_valid_plate;

/// A single character substitution with its prior weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfusionRule {
    /// Character as misread by OCR
    pub wrong: char,
    /// Character most likely printed on the plate
    pub correct: char,
    /// Prior confidence in the substitution, in (0, 1]
    pub weight: f32,
}

impl ConfusionRule {
    const fn new(wrong: char, correct: char, weight: f32) -> Self {
        Self {
            wrong,
            correct,
            weight,
        }
    }

    /// Replace every occurrence of the misread character
    pub fn apply(&self, text: &str) -> String {
        text.chars()
            .map(|c| if c == self.wrong { self.correct } else { c })
            .collect()
    }
}

/// Confusion table, highest expected value first. Order decides ties.
pub const CONFUSION_RULES: &[ConfusionRule] = &[
    ConfusionRule::new('H', 'N', 0.9),
    ConfusionRule::new('4', 'A', 0.8),
    ConfusionRule::new('0', 'O', 0.7),
    ConfusionRule::new('1', 'I', 0.7),
    ConfusionRule::new('5', 'S', 0.6),
    ConfusionRule::new('8', 'B', 0.6),
    ConfusionRule::new('Z', '2', 0.5),
    ConfusionRule::new('7', 'T', 0.5),
    ConfusionRule::new('D', '0', 0.4),
    ConfusionRule::new('Q', 'O', 0.4),
];

/// Bonus added when a substitution yields a well-formed plate
pub const VALID_FORMAT_BONUS: f32 = 0.5;

/// A substitution is only accepted above this score
pub const ACCEPT_THRESHOLD: f32 = 0.8;

/// Inputs shorter than this are returned untouched
pub const MIN_CORRECTABLE_LEN: usize = 6;

/// Correct systematic OCR misreads in a normalized string
///
/// Uses the built-in [`CONFUSION_RULES`] table.
pub fn correct(text: &str) -> String {
    correct_with_rules(text, CONFUSION_RULES)
}

/// Correct a normalized string against an explicit rule table
///
/// Every rule whose misread character occurs in the original text produces
/// one alternative (global replacement). The alternative scores the rule
/// weight plus [`VALID_FORMAT_BONUS`] when it passes plate validation. The
/// best-scoring alternative wins, earlier rules keep ties, and it is returned
/// only if its score exceeds [`ACCEPT_THRESHOLD`].
pub fn correct_with_rules(text: &str, rules: &[ConfusionRule]) -> String {
    if text.chars().count() < MIN_CORRECTABLE_LEN {
        return text.to_string();
    }

    let mut best_text: Option<String> = None;
    let mut best_score = 0.0f32;

    for rule in rules.iter().filter(|rule| text.contains(rule.wrong)) {
        let alternative = rule.apply(text);
        let mut score = rule.weight;
        if is_valid_plate(&alternative) {
            score += VALID_FORMAT_BONUS;
        }

        if score > best_score {
            best_score = score;
            best_text = Some(alternative);
        }
    }

    match best_text {
        Some(alternative) if best_score > ACCEPT_THRESHOLD && alternative != text => alternative,
        _ => text.to_string(),
    }
}
