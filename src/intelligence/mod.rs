// ABOUTME: Ingredient intelligence: name resolution, tiered nutrition lookup and estimation
// ABOUTME: Async components layered over the ingredient store and outbound providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Intelligence Module
//!
//! - [`IngredientResolver`]: free text to canonical ingredient
//! - [`NutritionAggregator`]: per-100g lookup and recipe totals
//! - [`NutritionEstimator`]: generative last-resort estimates

mod estimation;
mod ingredient_resolver;
mod nutrition_aggregator;

pub use estimation::{parse_estimate, NutritionEstimator, LLM_RATE_LIMIT_KEY};
pub use ingredient_resolver::{IngredientResolver, IngredientSuggestions};
pub use nutrition_aggregator::{NutritionAggregator, NutritionLookup, Provenance, RecipeNutrition};
