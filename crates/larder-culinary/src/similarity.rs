// ABOUTME: String similarity scores for approximate ingredient matching
// ABOUTME: Trigram Jaccard (pg_trgm semantics) for search, normalized Levenshtein for nutrition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::collections::HashSet;

/// Padded character trigrams of every word in `text`.
///
/// Each word is lowercased and padded with two leading spaces and one trailing
/// space before windows of three characters are taken, the same way
/// PostgreSQL's `pg_trgm` does it.
#[must_use]
pub fn trigrams(text: &str) -> HashSet<String> {
    let mut grams = HashSet::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
        for window in padded.windows(3) {
            grams.insert(window.iter().collect());
        }
    }
    grams
}

/// Trigram similarity in `[0, 1]`: shared trigrams over distinct trigrams
#[must_use]
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let (left, right) = (trigrams(a), trigrams(b));
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let total = left.union(&right).count();
    shared as f64 / total as f64
}

/// Edit-distance similarity in `[0, 1]` (1.0 for identical strings)
#[must_use]
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}
