// ABOUTME: Tunable similarity thresholds for ingredient search and nutrition matching
// ABOUTME: Also loads the recipe scaling policy tolerances from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use larder_core::constants::matching::{
    CANDIDATE_POOL, DEFAULT_SEARCH_LIMIT, EXACT_LIKE_THRESHOLD, MIN_SIMILARITY,
    NUTRITION_MATCH_THRESHOLD, SUGGESTION_LIMIT,
};
use larder_culinary::ScalingPolicy;
use serde::{Deserialize, Serialize};

use super::env_parse_or;

/// Matching thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Lowest trigram similarity a search result may have
    pub min_similarity: f64,
    /// Lowest edit-distance similarity accepted by the stored nutrition tier
    pub nutrition_match_threshold: f64,
    /// Similarity at which a suggestion is accepted as the ingredient
    pub exact_like_threshold: f64,
    /// Default result count for search
    pub search_limit: usize,
    /// Result count for find-or-suggest
    pub suggest_limit: usize,
    /// Candidates fetched before rescoring fuzzy nutrition matches
    pub candidate_pool: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_similarity: MIN_SIMILARITY,
            nutrition_match_threshold: NUTRITION_MATCH_THRESHOLD,
            exact_like_threshold: EXACT_LIKE_THRESHOLD,
            search_limit: DEFAULT_SEARCH_LIMIT,
            suggest_limit: SUGGESTION_LIMIT,
            candidate_pool: CANDIDATE_POOL,
        }
    }
}

impl MatchingConfig {
    /// Load from `LARDER_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_similarity: env_parse_or("LARDER_MIN_SIMILARITY", defaults.min_similarity),
            nutrition_match_threshold: env_parse_or(
                "LARDER_NUTRITION_MATCH_THRESHOLD",
                defaults.nutrition_match_threshold,
            ),
            exact_like_threshold: env_parse_or(
                "LARDER_EXACT_LIKE_THRESHOLD",
                defaults.exact_like_threshold,
            ),
            search_limit: env_parse_or("LARDER_SEARCH_LIMIT", defaults.search_limit),
            suggest_limit: env_parse_or("LARDER_SUGGEST_LIMIT", defaults.suggest_limit),
            candidate_pool: defaults.candidate_pool,
        }
    }
}

/// Scaling policy with `LARDER_*` overrides applied
#[must_use]
pub fn scaling_policy_from_env() -> ScalingPolicy {
    let defaults = ScalingPolicy::default();
    ScalingPolicy {
        whole_number_tolerance: env_parse_or(
            "LARDER_WHOLE_TOLERANCE",
            defaults.whole_number_tolerance,
        ),
        fraction_tolerance: env_parse_or("LARDER_FRACTION_TOLERANCE", defaults.fraction_tolerance),
        small_volume_threshold: env_parse_or(
            "LARDER_SMALL_VOLUME_THRESHOLD",
            defaults.small_volume_threshold,
        ),
        whole_item_omit_threshold: env_parse_or(
            "LARDER_WHOLE_ITEM_OMIT_THRESHOLD",
            defaults.whole_item_omit_threshold,
        ),
        whole_item_step: defaults.whole_item_step,
    }
}
