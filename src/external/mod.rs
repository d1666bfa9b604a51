// ABOUTME: External nutrition data sources behind the NutritionSource trait
// ABOUTME: Nutritionix natural-language client plus the per-serving food match type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! External API Clients
//!
//! The aggregator only sees [`NutritionSource`]. Every [`ProviderError`] a
//! source raises is treated as "no data" by the caller.

mod nutritionix_client;

pub use nutritionix_client::NutritionixClient;

use async_trait::async_trait;
use larder_core::constants::nutrition::REFERENCE_GRAMS;
use larder_core::errors::ProviderError;
use larder_core::models::Macros;
use serde::{Deserialize, Serialize};

/// One food recognized by an external source, with per-serving macros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodMatch {
    /// Name the source gave the food
    pub food_name: String,
    /// Weight of the serving the macros describe
    pub serving_weight_grams: f64,
    /// Macros for one serving
    pub per_serving: Macros,
}

impl FoodMatch {
    /// Macros rescaled to a 100 g basis, one decimal per field.
    ///
    /// `None` when the serving weight is not positive.
    #[must_use]
    pub fn per_100g(&self) -> Option<Macros> {
        if !(self.serving_weight_grams.is_finite() && self.serving_weight_grams > 0.0) {
            return None;
        }
        Some(
            self.per_serving
                .scale(REFERENCE_GRAMS / self.serving_weight_grams)
                .rounded(1),
        )
    }
}

/// Natural-language nutrition lookup
#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// Foods matching `query` (e.g. `"100g chicken breast"`)
    async fn search(&self, query: &str) -> Result<Vec<FoodMatch>, ProviderError>;
}
