// ABOUTME: In-memory ingredient store with the same create-if-absent semantics as SQLite
// ABOUTME: Used by tests and by embedders that do not need persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::collections::HashMap;

use async_trait::async_trait;
use larder_core::errors::{AppError, AppResult};
use larder_core::models::{Ingredient, IngredientAlias, NutritionRecord, UnitConversionOverride};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{canonical_form, dedup_ingredients, rank_by_similarity, IngredientStore};

#[derive(Debug, Default)]
struct Tables {
    // insertion order doubles as creation order
    ingredients: Vec<Ingredient>,
    aliases: Vec<IngredientAlias>,
    nutrition: HashMap<Uuid, NutritionRecord>,
    unit_overrides: HashMap<(Uuid, String), f64>,
}

impl Tables {
    fn ingredient(&self, id: Uuid) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    fn language_matches(alias: &IngredientAlias, language: Option<&str>) -> bool {
        language.map_or(true, |lang| alias.language.as_deref() == Some(lang))
    }
}

/// Ingredient store held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ingredients
    pub async fn ingredient_count(&self) -> usize {
        self.tables.read().await.ingredients.len()
    }
}

#[async_trait]
impl IngredientStore for InMemoryStore {
    async fn get_ingredient(&self, id: Uuid) -> AppResult<Option<Ingredient>> {
        Ok(self.tables.read().await.ingredient(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Ingredient>> {
        let name = name.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .ingredients
            .iter()
            .find(|i| i.canonical_name.to_lowercase() == name)
            .cloned())
    }

    async fn find_by_alias(
        &self,
        alias: &str,
        language: Option<&str>,
    ) -> AppResult<Option<Ingredient>> {
        let alias = alias.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .aliases
            .iter()
            .find(|a| a.alias == alias && Tables::language_matches(a, language))
            .and_then(|a| tables.ingredient(a.ingredient_id))
            .cloned())
    }

    async fn prefix_by_name(&self, prefix: &str, limit: usize) -> AppResult<Vec<Ingredient>> {
        let prefix = prefix.to_lowercase();
        let tables = self.tables.read().await;
        let mut matches: Vec<Ingredient> = tables
            .ingredients
            .iter()
            .filter(|i| i.canonical_name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.canonical_name.cmp(&b.canonical_name));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn prefix_by_alias(
        &self,
        prefix: &str,
        language: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Ingredient>> {
        let prefix = prefix.to_lowercase();
        let tables = self.tables.read().await;
        let mut hits: Vec<&IngredientAlias> = tables
            .aliases
            .iter()
            .filter(|a| a.alias.starts_with(&prefix) && Tables::language_matches(a, language))
            .collect();
        hits.sort_by(|a, b| a.alias.cmp(&b.alias));
        let ingredients = hits
            .into_iter()
            .take(limit)
            .filter_map(|a| tables.ingredient(a.ingredient_id).cloned())
            .collect();
        Ok(dedup_ingredients(ingredients))
    }

    async fn similar_names(
        &self,
        query: &str,
        min_score: f64,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>> {
        let tables = self.tables.read().await;
        let candidates = tables
            .ingredients
            .iter()
            .map(|i| (i.clone(), i.canonical_name.clone()));
        Ok(rank_by_similarity(candidates, query, min_score, limit))
    }

    async fn similar_aliases(
        &self,
        query: &str,
        language: Option<&str>,
        min_score: f64,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>> {
        let tables = self.tables.read().await;
        let candidates = tables
            .aliases
            .iter()
            .filter(|a| Tables::language_matches(a, language))
            .filter_map(|a| {
                tables
                    .ingredient(a.ingredient_id)
                    .map(|i| (i.clone(), a.alias.clone()))
            });
        Ok(rank_by_similarity(candidates, query, min_score, limit))
    }

    async fn aliases_for(&self, ingredient_id: Uuid) -> AppResult<Vec<IngredientAlias>> {
        let tables = self.tables.read().await;
        Ok(tables
            .aliases
            .iter()
            .filter(|a| a.ingredient_id == ingredient_id)
            .cloned()
            .collect())
    }

    async fn create_ingredient(&self, ingredient: &Ingredient) -> AppResult<Ingredient> {
        let name = canonical_form(&ingredient.canonical_name)?;
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.ingredients.iter().find(|i| i.canonical_name == name) {
            return Ok(existing.clone());
        }
        let created = Ingredient {
            canonical_name: name,
            ..ingredient.clone()
        };
        info!(ingredient_id = %created.id, canonical_name = %created.canonical_name, "Created ingredient");
        tables.ingredients.push(created.clone());
        Ok(created)
    }

    async fn create_alias(&self, alias: &IngredientAlias) -> AppResult<bool> {
        let normalized = alias.alias.trim().to_lowercase();
        let mut tables = self.tables.write().await;
        if tables.ingredient(alias.ingredient_id).is_none() {
            return Err(AppError::not_found(format!("Ingredient {}", alias.ingredient_id)));
        }
        let exists = tables
            .aliases
            .iter()
            .any(|a| a.alias == normalized && a.language == alias.language);
        if exists {
            return Ok(false);
        }
        tables.aliases.push(IngredientAlias {
            alias: normalized,
            ..alias.clone()
        });
        Ok(true)
    }

    async fn get_nutrition(&self, ingredient_id: Uuid) -> AppResult<Option<NutritionRecord>> {
        Ok(self.tables.read().await.nutrition.get(&ingredient_id).cloned())
    }

    async fn create_nutrition(&self, record: &NutritionRecord) -> AppResult<NutritionRecord> {
        let mut tables = self.tables.write().await;
        if tables.ingredient(record.ingredient_id).is_none() {
            return Err(AppError::not_found(format!("Ingredient {}", record.ingredient_id)));
        }
        Ok(tables
            .nutrition
            .entry(record.ingredient_id)
            .or_insert_with(|| record.clone())
            .clone())
    }

    async fn find_unit_override(
        &self,
        ingredient_id: Uuid,
        unit: &str,
    ) -> AppResult<Option<UnitConversionOverride>> {
        let tables = self.tables.read().await;
        Ok(tables
            .unit_overrides
            .get(&(ingredient_id, unit.to_owned()))
            .map(|grams| UnitConversionOverride {
                ingredient_id,
                unit: unit.to_owned(),
                grams_per_unit: *grams,
            }))
    }

    async fn save_unit_override(&self, conversion: &UnitConversionOverride) -> AppResult<()> {
        if conversion.grams_per_unit <= 0.0 || !conversion.grams_per_unit.is_finite() {
            return Err(AppError::invalid_input(format!(
                "grams_per_unit must be positive, got {}",
                conversion.grams_per_unit
            )));
        }
        self.tables.write().await.unit_overrides.insert(
            (conversion.ingredient_id, conversion.unit.clone()),
            conversion.grams_per_unit,
        );
        Ok(())
    }
}
