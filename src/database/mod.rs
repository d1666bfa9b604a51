// ABOUTME: Storage abstraction for ingredients, aliases, nutrition records and unit overrides
// ABOUTME: Defines the IngredientStore trait plus helpers shared by the SQLite and in-memory stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Ingredient Store
//!
//! Every write is create-if-absent: inserting an ingredient whose canonical
//! name already exists returns the stored row instead of failing, and a
//! nutrition record is never overwritten once written. Callers racing to
//! create the same ingredient therefore converge on one identity.

/// In-memory store for tests and embedded use
pub mod memory;
/// SQLite store backed by sqlx
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use larder_core::errors::{AppError, AppResult};
use larder_core::models::{Ingredient, IngredientAlias, NutritionRecord, UnitConversionOverride};
use larder_culinary::similarity::trigram_similarity;
use larder_culinary::text::normalize_ingredient_name;
use uuid::Uuid;

use crate::config::{DatabaseConfig, DatabaseUrl};

/// Persistent home of the ingredient catalogue
#[async_trait]
pub trait IngredientStore: Send + Sync {
    /// Ingredient by id
    async fn get_ingredient(&self, id: Uuid) -> AppResult<Option<Ingredient>>;

    /// Ingredient whose canonical name equals `name`, ignoring case
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Ingredient>>;

    /// Ingredient with alias `alias` (ignoring case); `language` narrows the match when given
    async fn find_by_alias(
        &self,
        alias: &str,
        language: Option<&str>,
    ) -> AppResult<Option<Ingredient>>;

    /// Ingredients whose canonical name starts with `prefix`, in name order
    async fn prefix_by_name(&self, prefix: &str, limit: usize) -> AppResult<Vec<Ingredient>>;

    /// Ingredients with an alias starting with `prefix`, in alias order
    async fn prefix_by_alias(
        &self,
        prefix: &str,
        language: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Ingredient>>;

    /// Canonical names scoring above `min_score` against `query`, best first
    async fn similar_names(
        &self,
        query: &str,
        min_score: f64,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>>;

    /// Aliases scoring above `min_score` against `query`, best first
    async fn similar_aliases(
        &self,
        query: &str,
        language: Option<&str>,
        min_score: f64,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>>;

    /// All aliases of an ingredient
    async fn aliases_for(&self, ingredient_id: Uuid) -> AppResult<Vec<IngredientAlias>>;

    /// Insert unless the canonical name exists; returns the stored ingredient either way.
    ///
    /// The name is stored normalized and singular, so "Tomatoes" and "tomato"
    /// are the same ingredient.
    async fn create_ingredient(&self, ingredient: &Ingredient) -> AppResult<Ingredient>;

    /// Insert unless `(alias, language)` exists; returns whether a row was written
    async fn create_alias(&self, alias: &IngredientAlias) -> AppResult<bool>;

    /// Nutrition record of an ingredient
    async fn get_nutrition(&self, ingredient_id: Uuid) -> AppResult<Option<NutritionRecord>>;

    /// Insert unless a record exists; returns the stored record either way
    async fn create_nutrition(&self, record: &NutritionRecord) -> AppResult<NutritionRecord>;

    /// Grams-per-unit override for `(ingredient, unit)`
    async fn find_unit_override(
        &self,
        ingredient_id: Uuid,
        unit: &str,
    ) -> AppResult<Option<UnitConversionOverride>>;

    /// Insert or replace the override for `(ingredient, unit)`
    async fn save_unit_override(&self, conversion: &UnitConversionOverride) -> AppResult<()>;
}

/// Open the store named by `config`
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated
pub async fn open_store(config: &DatabaseConfig) -> AppResult<Arc<dyn IngredientStore>> {
    if config.url == DatabaseUrl::InProcess {
        return Ok(Arc::new(InMemoryStore::new()));
    }
    let store = SqliteStore::connect(&config.url.to_connection_string()).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

/// Escape LIKE wildcards so user input matches literally (`ESCAPE '\'`)
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Canonical form of a new ingredient name
pub(crate) fn canonical_form(name: &str) -> AppResult<String> {
    let canonical = normalize_ingredient_name(name);
    if canonical.is_empty() {
        return Err(AppError::invalid_input(format!(
            "Ingredient name '{name}' has no letters or digits"
        )));
    }
    Ok(canonical)
}

/// Score `(ingredient, text)` candidates against `query`.
///
/// Keeps scores above `min_score`, keeps each ingredient's best
/// score once, and sorts best first. The sort is stable so equal scores keep
/// candidate order.
pub(crate) fn rank_by_similarity(
    candidates: impl IntoIterator<Item = (Ingredient, String)>,
    query: &str,
    min_score: f64,
    limit: usize,
) -> Vec<(Ingredient, f64)> {
    let mut scored: Vec<(Ingredient, f64)> = Vec::new();
    for (ingredient, text) in candidates {
        let score = trigram_similarity(query, &text);
        if score <= min_score {
            continue;
        }
        match scored.iter_mut().find(|(seen, _)| seen.id == ingredient.id) {
            Some(entry) if entry.1 < score => entry.1 = score,
            Some(_) => {}
            None => scored.push((ingredient, score)),
        }
    }
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

/// Drop repeated ingredients, keeping first occurrences
pub(crate) fn dedup_ingredients(ingredients: Vec<Ingredient>) -> Vec<Ingredient> {
    let mut seen = HashSet::new();
    ingredients
        .into_iter()
        .filter(|ingredient| seen.insert(ingredient.id))
        .collect()
}
