// ABOUTME: Core data models for ingredients, nutrition records, and recipes
// ABOUTME: Re-exports Ingredient, IngredientAlias, NutritionRecord, Macros, and Recipe types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Data Models
//!
//! - `Ingredient`: canonical entity every surface-form name resolves to
//! - `IngredientAlias`: alternate spelling, translation, or misspelling
//! - `NutritionRecord`: immutable per-100g macros with provenance
//! - `UnitConversionOverride`: ingredient-specific grams per unit
//! - `Recipe`: grouped ingredient lines consumed by scaling and aggregation

mod ingredient;
mod nutrition;
mod recipe;

pub use ingredient::{AliasType, Ingredient, IngredientAlias, IngredientCategory, UnitConversionOverride};
pub use nutrition::{DataSource, Macros, NutritionRecord};
pub use recipe::{IngredientGroup, Recipe, RecipeIngredientLine};
