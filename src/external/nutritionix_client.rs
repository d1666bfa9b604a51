// ABOUTME: Nutritionix natural-language nutrients API client
// ABOUTME: Implements TTL caching, per-minute rate limiting and provider error classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! Nutritionix API Client
//!
//! `POST {base}/natural/nutrients` with `x-app-id` / `x-app-key` headers and a
//! `{"query": ...}` body. Responses are cached per query for
//! `cache_ttl_secs` in a bounded LRU.
//!
//! # API Reference
//! <https://docx.syndigo.com/developers/docs/natural-language-for-nutrients>

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use larder_core::constants::network::CONNECT_TIMEOUT_SECS;
use larder_core::errors::{AppError, ProviderError};
use larder_core::models::Macros;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::{FoodMatch, NutritionSource};
use crate::config::NutritionixConfig;
use crate::llm::error_message_from_body;
use crate::rate_limiting::RateLimiter;

const PROVIDER: &str = "nutritionix";

#[derive(Debug, Serialize)]
struct NaturalQuery<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct NutrientsResponse {
    #[serde(default)]
    foods: Vec<NutritionixFood>,
}

#[derive(Debug, Deserialize)]
struct NutritionixFood {
    #[serde(default)]
    food_name: String,
    serving_weight_grams: Option<f64>,
    nf_calories: Option<f64>,
    nf_protein: Option<f64>,
    nf_total_carbohydrate: Option<f64>,
    nf_total_fat: Option<f64>,
    nf_dietary_fiber: Option<f64>,
}

impl From<NutritionixFood> for FoodMatch {
    fn from(food: NutritionixFood) -> Self {
        Self {
            food_name: food.food_name,
            serving_weight_grams: food.serving_weight_grams.unwrap_or(0.0),
            per_serving: Macros::new(
                food.nf_calories.unwrap_or(0.0),
                food.nf_protein.unwrap_or(0.0),
                food.nf_total_carbohydrate.unwrap_or(0.0),
                food.nf_total_fat.unwrap_or(0.0),
                food.nf_dietary_fiber.unwrap_or(0.0),
            ),
        }
    }
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// Nutritionix API client
pub struct NutritionixClient {
    config: NutritionixConfig,
    http_client: Client,
    cache: Mutex<LruCache<String, CacheEntry<Vec<FoodMatch>>>>,
    rate_limiter: RateLimiter,
}

impl NutritionixClient {
    /// Create a new Nutritionix client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: NutritionixConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let rate_limiter = RateLimiter::per_minute(config.rate_limit_per_minute);

        Ok(Self {
            config,
            http_client,
            cache: Mutex::new(LruCache::new(capacity)),
            rate_limiter,
        })
    }

    /// Drop every cached response
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Number of cached queries
    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn cached(&self, key: &str) -> Option<Vec<FoodMatch>> {
        let mut cache = self.cache.lock().await;
        match cache.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.data.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    async fn remember(&self, key: String, foods: &[FoodMatch]) {
        let entry = CacheEntry {
            data: foods.to_vec(),
            expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
        };
        self.cache.lock().await.put(key, entry);
    }

    fn classify_failure(status: StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
        let message = error_message_from_body(body);
        match status.as_u16() {
            401 | 403 => ProviderError::Authentication {
                provider: PROVIDER.to_owned(),
                message,
            },
            429 => ProviderError::QuotaExceeded {
                provider: PROVIDER.to_owned(),
                retry_after_secs: retry_after,
            },
            code => ProviderError::Api {
                provider: PROVIDER.to_owned(),
                status: code,
                message,
            },
        }
    }
}

#[async_trait]
impl NutritionSource for NutritionixClient {
    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn search(&self, query: &str) -> Result<Vec<FoodMatch>, ProviderError> {
        let (Some(app_id), Some(app_key)) = (&self.config.app_id, &self.config.app_key) else {
            return Err(ProviderError::NotConfigured(PROVIDER.to_owned()));
        };
        let key = query.trim().to_lowercase();
        if key.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(foods) = self.cached(&key).await {
            debug!(query = %key, "Nutritionix cache hit");
            return Ok(foods);
        }

        self.rate_limiter.acquire(PROVIDER).await;

        let url = format!(
            "{}/natural/nutrients",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http_client
            .post(&url)
            .header("x-app-id", app_id)
            .header("x-app-key", app_key)
            .json(&NaturalQuery { query })
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, &e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, &e))?;

        // Nutritionix answers 404 when it recognizes no food in the query
        if status == StatusCode::NOT_FOUND {
            debug!(query = %key, "Nutritionix matched no foods");
            self.remember(key, &[]).await;
            return Ok(Vec::new());
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "Nutritionix request failed");
            return Err(Self::classify_failure(status, retry_after, &body));
        }

        let parsed: NutrientsResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER.to_owned(),
                message: e.to_string(),
            })?;
        let foods: Vec<FoodMatch> = parsed.foods.into_iter().map(FoodMatch::from).collect();
        debug!(query = %key, count = foods.len(), "Nutritionix returned foods");

        self.remember(key, &foods).await;
        Ok(foods)
    }
}
