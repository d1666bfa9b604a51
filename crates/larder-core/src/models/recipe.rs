// ABOUTME: Recipe input model consumed by the scaler and the nutrition aggregator
// ABOUTME: Recipe, IngredientGroup, and RecipeIngredientLine with serde defaults for JSON input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecipeIngredientLine {
    /// Line identifier, used as the anchor for ingredient-based scaling
    pub id: String,
    /// Ingredient name as written in the recipe
    pub name: String,
    /// Quantity; `None` for "to taste" style lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Unit symbol as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Preparation notes ("finely chopped")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    /// Whether the line is optional
    #[serde(default)]
    pub optional: bool,
    /// Display position within its group
    #[serde(default)]
    pub position: u32,
    /// Direct link to a canonical ingredient, when already resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<Uuid>,
}

impl RecipeIngredientLine {
    /// Convenience constructor for a measured line
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, amount: f64, unit: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount: Some(amount),
            unit: unit.map(str::to_owned),
            ..Self::default()
        }
    }

    /// Attach preparation notes
    #[must_use]
    pub fn with_preparation(mut self, preparation: impl Into<String>) -> Self {
        self.preparation = Some(preparation.into());
        self
    }

    /// Link the line to a canonical ingredient
    #[must_use]
    pub const fn with_ingredient(mut self, ingredient_id: Uuid) -> Self {
        self.ingredient_id = Some(ingredient_id);
        self
    }
}

/// Named group of ingredient lines ("For the sauce")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IngredientGroup {
    /// Group heading; `None` for the implicit main group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Lines in display order
    #[serde(default)]
    pub items: Vec<RecipeIngredientLine>,
}

/// Recipe as seen by scaling and nutrition aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe title
    pub name: String,
    /// Language tag of the ingredient names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Servings the amounts are written for
    #[serde(default = "default_servings")]
    pub servings_original: f64,
    /// Small-quantity accuracy matters (baking)
    #[serde(default)]
    pub requires_precision: bool,
    /// Free-form recipe type tags (`baking`, `dessert`, ...)
    #[serde(default)]
    pub recipe_types: Vec<String>,
    /// Ingredient groups in display order
    #[serde(default)]
    pub ingredient_groups: Vec<IngredientGroup>,
}

const fn default_servings() -> f64 {
    1.0
}

impl Recipe {
    /// Create an empty recipe
    #[must_use]
    pub fn new(name: impl Into<String>, servings_original: f64) -> Self {
        Self {
            name: name.into(),
            language: None,
            servings_original,
            requires_precision: false,
            recipe_types: Vec::new(),
            ingredient_groups: Vec::new(),
        }
    }

    /// Add a group
    #[must_use]
    pub fn with_group(mut self, name: Option<&str>, items: Vec<RecipeIngredientLine>) -> Self {
        self.ingredient_groups.push(IngredientGroup {
            name: name.map(str::to_owned),
            items,
        });
        self
    }

    /// Mark the recipe as precision-sensitive
    #[must_use]
    pub const fn with_precision(mut self, requires_precision: bool) -> Self {
        self.requires_precision = requires_precision;
        self
    }

    /// Baking recipes are precision-sensitive whether flagged or tagged
    #[must_use]
    pub fn is_precision_sensitive(&self) -> bool {
        self.requires_precision
            || self
                .recipe_types
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case("baking"))
    }

    /// Every line across all groups, in order
    pub fn lines(&self) -> impl Iterator<Item = &RecipeIngredientLine> {
        self.ingredient_groups.iter().flat_map(|g| g.items.iter())
    }

    /// Find a line by id
    #[must_use]
    pub fn find_line(&self, id: &str) -> Option<&RecipeIngredientLine> {
        self.lines().find(|line| line.id == id)
    }
}
