// ABOUTME: Generative per-100g nutrition estimates with rate limiting and retry backoff
// ABOUTME: Parses model output tolerantly and falls back to fixed defaults on any failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! Last-resort nutrition tier.
//!
//! The estimator never fails: a missing provider, an exhausted retry budget
//! or unparseable output all yield [`Macros::fallback`].

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use larder_core::errors::{AppError, ErrorCode};
use larder_core::models::Macros;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::EstimatorConfig;
use crate::llm::prompts::{estimate_user_prompt, NUTRITION_ESTIMATE_SYSTEM_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rate_limiting::RateLimiter;

/// Rate limiter key shared by every generative call
pub const LLM_RATE_LIMIT_KEY: &str = "llm";

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok());
static FIRST_OBJECT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").ok());

#[derive(Debug, Deserialize)]
struct EstimatePayload {
    calories: f64,
    #[serde(default)]
    protein_g: f64,
    #[serde(default)]
    carbs_g: f64,
    #[serde(default)]
    fat_g: f64,
    #[serde(default)]
    fiber_g: f64,
}

/// Pull per-100g macros out of free model text.
///
/// Accepts a bare object, an object inside a markdown code fence, or the
/// first `{...}` block embedded in prose. Negative or non-finite values are
/// rejected.
#[must_use]
pub fn parse_estimate(text: &str) -> Option<Macros> {
    let fenced = FENCED_JSON
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    let candidate = fenced.or_else(|| {
        FIRST_OBJECT
            .as_ref()
            .and_then(|re| re.find(text))
            .map(|m| m.as_str())
    })?;

    let payload: EstimatePayload = serde_json::from_str(candidate).ok()?;
    let macros = Macros::new(
        payload.calories,
        payload.protein_g,
        payload.carbs_g,
        payload.fat_g,
        payload.fiber_g,
    );
    macros.is_plausible().then_some(macros)
}

/// Whether a failed completion is worth retrying
fn is_retryable(error: &AppError) -> bool {
    !matches!(
        error.code,
        ErrorCode::ExternalAuthFailed
            | ErrorCode::ConfigError
            | ErrorCode::InvalidInput
            | ErrorCode::ResourceNotFound
    )
}

/// Asks an LLM for per-100g macros
pub struct NutritionEstimator {
    provider: Option<Arc<dyn LlmProvider>>,
    rate_limiter: Arc<RateLimiter>,
    config: EstimatorConfig,
}

impl NutritionEstimator {
    /// Estimator backed by `provider`, spaced by the configured minimum interval
    #[must_use]
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, config: EstimatorConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.min_interval_ms,
        )));
        Self {
            provider,
            rate_limiter,
            config,
        }
    }

    /// Estimator that always answers with the fallback defaults
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, EstimatorConfig::default())
    }

    /// Whether a provider is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Per-100g estimate for `name`, or the fallback defaults
    #[instrument(skip(self), fields(provider = self.provider.as_ref().map_or("none", |p| p.name())))]
    pub async fn estimate(&self, name: &str) -> Macros {
        let Some(provider) = &self.provider else {
            debug!("No LLM provider configured, using fallback nutrition");
            return Macros::fallback();
        };

        let request = ChatRequest::new(vec![
            ChatMessage::system(NUTRITION_ESTIMATE_SYSTEM_PROMPT),
            ChatMessage::user(estimate_user_prompt(name)),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let text = match self.complete_with_retry(provider.as_ref(), &request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Nutrition estimate failed, using fallback nutrition");
                return Macros::fallback();
            }
        };

        parse_estimate(&text).unwrap_or_else(|| {
            warn!(raw = %text, "Unparseable nutrition estimate, using fallback nutrition");
            Macros::fallback()
        })
    }

    async fn complete_with_retry(
        &self,
        provider: &dyn LlmProvider,
        request: &ChatRequest,
    ) -> Result<String, AppError> {
        let mut attempt: u32 = 0;
        loop {
            self.rate_limiter.acquire(LLM_RATE_LIMIT_KEY).await;
            match provider.complete(request).await {
                Ok(response) => return Ok(response.content),
                Err(e) if attempt < self.config.max_retries && is_retryable(&e) => {
                    let delay = Duration::from_millis(
                        self.config
                            .backoff_base_ms
                            .saturating_mul(2_u64.saturating_pow(attempt)),
                    );
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_object() {
        let macros = parse_estimate(
            r#"{"calories": 120, "protein_g": 5, "carbs_g": 20, "fat_g": 2, "fiber_g": 3}"#,
        );
        assert_eq!(macros, Some(Macros::new(120.0, 5.0, 20.0, 2.0, 3.0)));
    }

    #[test]
    fn test_parse_fenced_object() {
        let text = "Here you go:\n```json\n{\"calories\": 34, \"protein_g\": 2.8, \"carbs_g\": 6.6, \"fat_g\": 0.4, \"fiber_g\": 2.6}\n```";
        assert_eq!(parse_estimate(text).map(|m| m.calories), Some(34.0));
    }

    #[test]
    fn test_parse_embedded_object() {
        let text = "Kohlrabi is {\"calories\": 27, \"protein_g\": 1.7, \"carbs_g\": 6.2, \"fat_g\": 0.1, \"fiber_g\": 3.6} per 100g.";
        assert_eq!(parse_estimate(text).map(|m| m.fiber_g), Some(3.6));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_estimate("I am not sure.").is_none());
        assert!(parse_estimate("{\"calories\": \"lots\"}").is_none());
        assert!(parse_estimate("{\"calories\": -5}").is_none());
    }

    #[tokio::test]
    async fn test_disabled_estimator_returns_fallback() {
        let estimator = NutritionEstimator::disabled();
        assert!(!estimator.is_enabled());
        assert_eq!(estimator.estimate("dragonfruit").await, Macros::fallback());
    }
}
