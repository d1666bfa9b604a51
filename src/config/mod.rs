// ABOUTME: Configuration management for the Larder engine, loaded from environment variables
// ABOUTME: Aggregates database, matching thresholds, scaling policy and outbound provider settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! Configuration module for Larder
//!
//! Every section has a `Default` matching the built-in constants and a
//! `from_env()` that overrides individual fields. Unparseable values fall
//! back to the default rather than failing startup.

use std::env;
use std::str::FromStr;

use larder_culinary::ScalingPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// External nutrition API and LLM estimator settings
pub mod api_providers;
/// Store location
pub mod database;
/// Similarity thresholds and scaling tolerances
pub mod matching;

pub use api_providers::{EstimatorConfig, LlmProviderType, NutritionixConfig};
pub use database::{DatabaseConfig, DatabaseUrl};
pub use matching::MatchingConfig;

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LarderConfig {
    /// Ingredient store
    pub database: DatabaseConfig,
    /// Search and nutrition matching thresholds
    pub matching: MatchingConfig,
    /// Recipe scaling tolerances
    pub scaling: ScalingPolicy,
    /// External nutrition API
    pub nutritionix: NutritionixConfig,
    /// Generative nutrition estimator
    pub estimator: EstimatorConfig,
}

impl LarderConfig {
    /// Load every section from the environment
    #[must_use]
    pub fn from_env() -> Self {
        let config = Self {
            database: DatabaseConfig::from_env(),
            matching: MatchingConfig::from_env(),
            scaling: matching::scaling_policy_from_env(),
            nutritionix: NutritionixConfig::from_env(),
            estimator: EstimatorConfig::from_env(),
        };
        debug!(
            database = %config.database.url,
            llm_provider = config.estimator.provider.as_str(),
            nutritionix = config.nutritionix.is_configured(),
            "Loaded Larder configuration"
        );
        config
    }
}

/// Parse `key` into `T`, or `default` when unset or unparseable
pub(crate) fn env_parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

/// Get environment variable or default value
pub(crate) fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Non-empty environment variable
pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
