// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Matching thresholds, nutrition defaults, and scaling tolerances for Larder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! Constants module
//!
//! Every threshold here is an empirically chosen default. The runtime values
//! live in configuration structs so deployments can tune them; these are only
//! the starting points.

/// Service identity used in logs
pub mod service_names {
    /// Library/service name
    pub const LARDER: &str = "larder";
}

/// Ingredient name matching thresholds
pub mod matching {
    /// Minimum trigram similarity for a search candidate to be returned
    pub const MIN_SIMILARITY: f64 = 0.3;
    /// Minimum similarity for a stored nutrition record to match a query
    pub const NUTRITION_MATCH_THRESHOLD: f64 = 0.85;
    /// Similarity at which a suggestion is treated as the same ingredient
    pub const EXACT_LIKE_THRESHOLD: f64 = 0.9;
    /// Default result count for `search`
    pub const DEFAULT_SEARCH_LIMIT: usize = 10;
    /// Result count used by `find_or_suggest`
    pub const SUGGESTION_LIMIT: usize = 5;
    /// Candidate pool requested from the store before rescoring
    pub const CANDIDATE_POOL: usize = 25;
}

/// Nutrition lookup defaults
pub mod nutrition {
    /// Confidence assigned to curated and external API data
    pub const CONFIDENCE_VERIFIED: f64 = 1.0;
    /// Confidence assigned to generative estimates
    pub const CONFIDENCE_ESTIMATED: f64 = 0.7;
    /// Reference mass every nutrition record is expressed against
    pub const REFERENCE_GRAMS: f64 = 100.0;

    /// Calories used when no tier produced data
    pub const FALLBACK_CALORIES: f64 = 100.0;
    /// Protein (g) used when no tier produced data
    pub const FALLBACK_PROTEIN_G: f64 = 2.0;
    /// Carbohydrates (g) used when no tier produced data
    pub const FALLBACK_CARBS_G: f64 = 15.0;
    /// Fat (g) used when no tier produced data
    pub const FALLBACK_FAT_G: f64 = 2.0;
    /// Fiber (g) used when no tier produced data
    pub const FALLBACK_FIBER_G: f64 = 1.0;
}

/// Recipe scaling tolerances
pub mod scaling {
    /// Distance from an integer within which amounts snap to it
    pub const WHOLE_NUMBER_TOLERANCE: f64 = 0.1;
    /// Distance from a friendly fraction within which amounts snap to it
    pub const FRACTION_TOLERANCE: f64 = 0.05;
    /// Below this many cups/tbsp/tsp, baking amounts switch to grams
    pub const SMALL_VOLUME_THRESHOLD: f64 = 0.25;
    /// Below this scaled count, whole items are omitted (non-baking)
    pub const WHOLE_ITEM_OMIT_THRESHOLD: f64 = 0.3;
    /// Whole items round to multiples of this step
    pub const WHOLE_ITEM_STEP: f64 = 0.5;
}

/// Outbound call limits
pub mod network {
    /// Connect timeout for outbound HTTP calls
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Whole-request timeout for outbound HTTP calls
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Minimum spacing between generative estimation calls
    pub const LLM_MIN_INTERVAL_MS: u64 = 1000;
    /// Retries after the first failed generative call
    pub const LLM_MAX_RETRIES: u32 = 3;
    /// First backoff delay; doubles on each retry
    pub const LLM_BACKOFF_BASE_MS: u64 = 2000;
}
