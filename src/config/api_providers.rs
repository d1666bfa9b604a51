// ABOUTME: Outbound provider configuration for the Nutritionix API and the LLM estimator
// ABOUTME: Credentials, base URLs, timeouts, cache TTLs, rate limits and retry policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use larder_core::constants::network::{
    LLM_BACKOFF_BASE_MS, LLM_MAX_RETRIES, LLM_MIN_INTERVAL_MS, REQUEST_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};

use super::{env_non_empty, env_parse_or, env_var_or};

/// Default Nutritionix API base URL
pub const NUTRITIONIX_DEFAULT_BASE_URL: &str = "https://trackapi.nutritionix.com/v2";

/// Nutritionix natural-language nutrients API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionixConfig {
    /// Application id (`x-app-id`)
    pub app_id: Option<String>,
    /// Application key (`x-app-key`)
    #[serde(skip_serializing)]
    pub app_key: Option<String>,
    /// Base URL (default: <https://trackapi.nutritionix.com/v2>)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Cache TTL in seconds (default: 86400 = 24 hours)
    pub cache_ttl_secs: u64,
    /// Cached queries kept at most
    pub cache_capacity: usize,
    /// Requests allowed per minute
    pub rate_limit_per_minute: u32,
}

impl Default for NutritionixConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            base_url: NUTRITIONIX_DEFAULT_BASE_URL.to_owned(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            cache_ttl_secs: 86_400,
            cache_capacity: 512,
            rate_limit_per_minute: 60,
        }
    }
}

impl NutritionixConfig {
    /// Load from `NUTRITIONIX_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_id: env_non_empty("NUTRITIONIX_APP_ID"),
            app_key: env_non_empty("NUTRITIONIX_APP_KEY"),
            base_url: env_var_or("NUTRITIONIX_BASE_URL", NUTRITIONIX_DEFAULT_BASE_URL),
            timeout_secs: env_parse_or("NUTRITIONIX_TIMEOUT_SECS", defaults.timeout_secs),
            ..defaults
        }
    }

    /// Both credentials are present
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.app_id.is_some() && self.app_key.is_some()
    }
}

/// Which LLM backs the generative estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Anthropic messages API
    Anthropic,
    /// Any `OpenAI`-compatible chat completions endpoint
    #[serde(rename = "openai")]
    OpenAiCompatible,
    /// Estimation disabled; fallback defaults are used
    #[default]
    None,
}

impl LlmProviderType {
    /// Environment value for this provider
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAiCompatible => "openai",
            Self::None => "none",
        }
    }

    /// Parse an environment value, defaulting to `None` for anything unknown
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Self::Anthropic,
            "openai" | "openai-compatible" | "ollama" | "vllm" | "local" => Self::OpenAiCompatible,
            _ => Self::None,
        }
    }
}

/// Generative estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Backing provider (`LARDER_LLM_PROVIDER`)
    pub provider: LlmProviderType,
    /// Minimum spacing between estimator calls, in milliseconds
    pub min_interval_ms: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// First retry delay; doubles on each retry
    pub backoff_base_ms: u64,
    /// Sampling temperature for estimates
    pub temperature: f32,
    /// Token budget for one estimate
    pub max_tokens: u32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderType::None,
            min_interval_ms: LLM_MIN_INTERVAL_MS,
            max_retries: LLM_MAX_RETRIES,
            backoff_base_ms: LLM_BACKOFF_BASE_MS,
            temperature: 0.2,
            max_tokens: 300,
        }
    }
}

impl EstimatorConfig {
    /// Load from `LARDER_LLM_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: LlmProviderType::parse(&env_var_or("LARDER_LLM_PROVIDER", "none")),
            min_interval_ms: env_parse_or("LARDER_LLM_MIN_INTERVAL_MS", defaults.min_interval_ms),
            max_retries: env_parse_or("LARDER_LLM_MAX_RETRIES", defaults.max_retries),
            backoff_base_ms: env_parse_or("LARDER_LLM_BACKOFF_BASE_MS", defaults.backoff_base_ms),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_provider_type_parse() {
        assert_eq!(LlmProviderType::parse("Anthropic"), LlmProviderType::Anthropic);
        assert_eq!(LlmProviderType::parse("ollama"), LlmProviderType::OpenAiCompatible);
        assert_eq!(LlmProviderType::parse("gpt"), LlmProviderType::None);
        assert_eq!(LlmProviderType::OpenAiCompatible.as_str(), "openai");
    }

    #[test]
    fn test_nutritionix_requires_both_credentials() {
        let mut config = NutritionixConfig {
            app_id: Some("id".into()),
            ..NutritionixConfig::default()
        };
        assert!(!config.is_configured());
        config.app_key = Some("key".into());
        assert!(config.is_configured());
    }
}
