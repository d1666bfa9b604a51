// ABOUTME: Canonical ingredient entity, aliases, and per-ingredient unit overrides
// ABOUTME: IngredientCategory and AliasType enums round-trip through their database strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse ingredient category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    /// Vegetables and fruit
    Vegetable,
    /// Meat, fish, eggs, legumes
    Protein,
    /// Grains, flours, pasta, bread
    Grain,
    /// Milk and milk products
    Dairy,
    /// Anything else
    #[default]
    Other,
}

impl IngredientCategory {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vegetable => "vegetable",
            Self::Protein => "protein",
            Self::Grain => "grain",
            Self::Dairy => "dairy",
            Self::Other => "other",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "vegetable" => Self::Vegetable,
            "protein" => Self::Protein,
            "grain" => Self::Grain,
            "dairy" => Self::Dairy,
            // Default to Other for unrecognized values
            _ => Self::Other,
        }
    }
}

/// How an alias relates to its canonical ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AliasType {
    /// Same language, different word or inflection
    #[default]
    Synonym,
    /// Same ingredient in another language
    Translation,
    /// Observed misspelling
    Misspelling,
}

impl AliasType {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synonym => "synonym",
            Self::Translation => "translation",
            Self::Misspelling => "misspelling",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "translation" => Self::Translation,
            "misspelling" => Self::Misspelling,
            _ => Self::Synonym,
        }
    }
}

/// Canonical ingredient
///
/// `canonical_name` is stored normalized (trimmed, lowercased, singularized) and
/// never changes after creation; variant spellings become aliases instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Unique identifier
    pub id: Uuid,
    /// Normalized canonical name (unique)
    pub canonical_name: String,
    /// Coarse category
    pub category: IngredientCategory,
    /// When the ingredient was first created
    pub created_at: DateTime<Utc>,
}

impl Ingredient {
    /// Build a new ingredient with a fresh id
    #[must_use]
    pub fn new(canonical_name: impl Into<String>, category: IngredientCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            canonical_name: canonical_name.into(),
            category,
            created_at: Utc::now(),
        }
    }
}

/// Alternate surface form of an ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAlias {
    /// Ingredient the alias points at
    pub ingredient_id: Uuid,
    /// Alias text (normalized)
    pub alias: String,
    /// Language tag (`en`, `ja`, `zh-tw`, ...), if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Relationship to the canonical name
    pub alias_type: AliasType,
}

impl IngredientAlias {
    /// Create an alias record
    #[must_use]
    pub fn new(
        ingredient_id: Uuid,
        alias: impl Into<String>,
        language: Option<&str>,
        alias_type: AliasType,
    ) -> Self {
        Self {
            ingredient_id,
            alias: alias.into(),
            language: language.map(str::to_owned),
            alias_type,
        }
    }
}

/// Ingredient-specific grams per unit, preferred over density heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversionOverride {
    /// Ingredient the override applies to
    pub ingredient_id: Uuid,
    /// Canonical unit symbol (`cup`, `tbsp`, `piece`, ...)
    pub unit: String,
    /// Grams in one unit; always positive
    pub grams_per_unit: f64,
}
