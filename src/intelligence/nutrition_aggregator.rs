// ABOUTME: Tiered per-100g nutrition lookup (stored, external API, generative estimate) and recipe totals
// ABOUTME: Persists new data create-if-absent under a per-name lock that is never held across network calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Nutrition Aggregator
//!
//! Lookup tiers, each tried only when the one before produced nothing:
//!
//! 1. stored records (exact name, alias, then edit-distance fuzzy match)
//! 2. the external [`NutritionSource`], rescaled to 100 g
//! 3. the generative [`NutritionEstimator`], which always answers
//!
//! Lookups never fail. Store and provider errors are logged and the tier is
//! treated as empty.

use std::sync::Arc;

use dashmap::DashMap;
use larder_core::constants::nutrition::{CONFIDENCE_ESTIMATED, CONFIDENCE_VERIFIED};
use larder_core::errors::AppResult;
use larder_core::models::{
    AliasType, DataSource, Ingredient, IngredientAlias, Macros, NutritionRecord, Recipe,
    RecipeIngredientLine,
};
use larder_culinary::similarity::levenshtein_similarity;
use larder_culinary::text::{guess_category, normalize_ingredient_name, normalize_query};
use larder_culinary::units::canonical_unit;
use larder_culinary::{estimate_grams, UnitGraph};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::estimation::NutritionEstimator;
use crate::config::MatchingConfig;
use crate::database::{dedup_ingredients, IngredientStore};
use crate::external::{FoodMatch, NutritionSource};

/// Where a lookup's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Ingredient holding the record
    pub ingredient_id: Uuid,
    /// Tier that produced the record
    pub data_source: DataSource,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
}

/// Per-100g macros for one ingredient name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionLookup {
    /// Macros per 100 g
    pub per_100g: Macros,
    /// Absent when nothing was stored (blank name, or persistence failed)
    pub provenance: Option<Provenance>,
}

impl NutritionLookup {
    /// Zero macros, no provenance
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            per_100g: Macros::zero(),
            provenance: None,
        }
    }

    /// Unsaved macros
    #[must_use]
    pub const fn unsaved(per_100g: Macros) -> Self {
        Self {
            per_100g,
            provenance: None,
        }
    }
}

impl From<&NutritionRecord> for NutritionLookup {
    fn from(record: &NutritionRecord) -> Self {
        Self {
            per_100g: record.per_100g,
            provenance: Some(Provenance {
                ingredient_id: record.ingredient_id,
                data_source: record.data_source,
                confidence: record.confidence_score,
            }),
        }
    }
}

/// Nutrition of a whole recipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipeNutrition {
    /// Sum over every line, one decimal
    pub total: Macros,
    /// `total / max(servings, 1)`; whole calories, one decimal elsewhere
    pub per_serving: Macros,
    /// Servings the recipe was written for
    pub servings: f64,
}

/// Tiered nutrition lookup and recipe aggregation
pub struct NutritionAggregator {
    store: Arc<dyn IngredientStore>,
    source: Option<Arc<dyn NutritionSource>>,
    estimator: NutritionEstimator,
    graph: Arc<UnitGraph>,
    matching: MatchingConfig,
    creation_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NutritionAggregator {
    /// Aggregator over `store` with the given outbound tiers
    #[must_use]
    pub fn new(
        store: Arc<dyn IngredientStore>,
        source: Option<Arc<dyn NutritionSource>>,
        estimator: NutritionEstimator,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            store,
            source,
            estimator,
            graph: Arc::new(UnitGraph::standard_owned()),
            matching,
            creation_locks: DashMap::new(),
        }
    }

    /// Use `graph` for gram conversions
    #[must_use]
    pub fn with_graph(mut self, graph: Arc<UnitGraph>) -> Self {
        self.graph = graph;
        self
    }

    /// Per-100g macros for a free-text ingredient name
    #[instrument(skip(self))]
    pub async fn lookup_ingredient(&self, name: &str, language: Option<&str>) -> NutritionLookup {
        let normalized = normalize_ingredient_name(name);
        if normalized.is_empty() {
            return NutritionLookup::empty();
        }

        if let Some(found) = self.from_store(&normalized, language).await {
            debug!(tier = "stored", "Nutrition found");
            return found;
        }
        if let Some(found) = self.from_external(name, &normalized, language).await {
            debug!(tier = "external_api", "Nutrition found");
            return found;
        }
        debug!(tier = "generative_estimate", "Falling back to estimate");
        self.from_estimate(name, &normalized, language).await
    }

    // ------------------------------------------------------------------
    // Tier 1: stored records
    // ------------------------------------------------------------------

    async fn from_store(&self, normalized: &str, language: Option<&str>) -> Option<NutritionLookup> {
        match self.stored_lookup(normalized, language).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Stored nutrition lookup failed");
                None
            }
        }
    }

    async fn stored_lookup(
        &self,
        normalized: &str,
        language: Option<&str>,
    ) -> AppResult<Option<NutritionLookup>> {
        let mut exact = Vec::new();
        exact.extend(self.store.find_by_name(normalized).await?);
        if language.is_some() {
            exact.extend(self.store.find_by_alias(normalized, language).await?);
        }
        exact.extend(self.store.find_by_alias(normalized, None).await?);

        for ingredient in dedup_ingredients(exact) {
            if let Some(record) = self.store.get_nutrition(ingredient.id).await? {
                return Ok(Some(NutritionLookup::from(&record)));
            }
        }

        self.fuzzy_stored_lookup(normalized).await
    }

    /// Best edit-distance match among similarity candidates that have a record
    async fn fuzzy_stored_lookup(&self, normalized: &str) -> AppResult<Option<NutritionLookup>> {
        let pool = self.matching.candidate_pool;
        let min = self.matching.min_similarity;
        let mut candidates = self.store.similar_names(normalized, min, pool).await?;
        candidates.extend(
            self.store
                .similar_aliases(normalized, None, min, pool)
                .await?,
        );
        let candidates = dedup_ingredients(candidates.into_iter().map(|(i, _)| i).collect());

        let mut best: Option<(f64, NutritionRecord)> = None;
        for ingredient in candidates {
            let score = self.edit_similarity(&ingredient, normalized).await?;
            if score < self.matching.nutrition_match_threshold
                || best.as_ref().is_some_and(|(top, _)| *top >= score)
            {
                continue;
            }
            if let Some(record) = self.store.get_nutrition(ingredient.id).await? {
                debug!(
                    candidate = %ingredient.canonical_name,
                    similarity = score,
                    "Fuzzy stored nutrition candidate"
                );
                best = Some((score, record));
            }
        }
        Ok(best.map(|(_, record)| NutritionLookup::from(&record)))
    }

    async fn edit_similarity(&self, ingredient: &Ingredient, normalized: &str) -> AppResult<f64> {
        let canonical = levenshtein_similarity(&ingredient.canonical_name, normalized);
        let aliases = self.store.aliases_for(ingredient.id).await?;
        Ok(aliases
            .iter()
            .map(|a| levenshtein_similarity(&a.alias, normalized))
            .fold(canonical, f64::max))
    }

    // ------------------------------------------------------------------
    // Tier 2: external nutrition source
    // ------------------------------------------------------------------

    async fn from_external(
        &self,
        raw: &str,
        normalized: &str,
        language: Option<&str>,
    ) -> Option<NutritionLookup> {
        let source = self.source.as_ref()?;
        let foods = match source.search(&format!("100g {normalized}")).await {
            Ok(foods) => foods,
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "External nutrition lookup failed");
                return None;
            }
        };
        let Some(per_100g) = foods.iter().find_map(FoodMatch::per_100g) else {
            debug!("External source returned no usable foods");
            return None;
        };

        Some(
            self.persist(
                raw,
                normalized,
                language,
                per_100g,
                DataSource::ExternalApi,
                CONFIDENCE_VERIFIED,
            )
            .await,
        )
    }

    // ------------------------------------------------------------------
    // Tier 3: generative estimate
    // ------------------------------------------------------------------

    async fn from_estimate(
        &self,
        raw: &str,
        normalized: &str,
        language: Option<&str>,
    ) -> NutritionLookup {
        let per_100g = self.estimator.estimate(normalized).await;
        self.persist(
            raw,
            normalized,
            language,
            per_100g,
            DataSource::GenerativeEstimate,
            CONFIDENCE_ESTIMATED,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Store new macros, serialized per canonical name.
    ///
    /// When another caller stored a record first, that record wins. Failures
    /// are logged and the computed macros are returned without provenance.
    async fn persist(
        &self,
        raw: &str,
        canonical: &str,
        language: Option<&str>,
        per_100g: Macros,
        data_source: DataSource,
        confidence: f64,
    ) -> NutritionLookup {
        let lock = self
            .creation_locks
            .entry(canonical.to_owned())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.persist_locked(raw, canonical, language, per_100g, data_source, confidence)
                .await
        };
        drop(lock);
        self.creation_locks
            .remove_if(canonical, |_, lock| Arc::strong_count(lock) == 1);

        match result {
            Ok(record) => NutritionLookup::from(&record),
            Err(e) => {
                warn!(ingredient = %canonical, error = %e, "Failed to persist nutrition");
                NutritionLookup::unsaved(per_100g)
            }
        }
    }

    async fn persist_locked(
        &self,
        raw: &str,
        canonical: &str,
        language: Option<&str>,
        per_100g: Macros,
        data_source: DataSource,
        confidence: f64,
    ) -> AppResult<NutritionRecord> {
        let candidate = Ingredient::new(canonical, guess_category(canonical));
        let ingredient = self.store.create_ingredient(&candidate).await?;
        if ingredient.id == candidate.id {
            info!(
                ingredient = %ingredient.canonical_name,
                category = ingredient.category.as_str(),
                source = data_source.as_str(),
                "Created ingredient"
            );
        }

        let record = self
            .store
            .create_nutrition(&NutritionRecord::new(
                ingredient.id,
                per_100g,
                data_source,
                confidence,
            ))
            .await?;

        let surface = normalize_query(raw);
        if !surface.is_empty() && surface != ingredient.canonical_name.to_lowercase() {
            let alias = IngredientAlias::new(ingredient.id, surface, language, AliasType::Synonym);
            self.store.create_alias(&alias).await?;
        }
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Recipe totals
    // ------------------------------------------------------------------

    /// Total and per-serving nutrition of a recipe
    #[instrument(skip(self, recipe), fields(recipe = %recipe.name))]
    pub async fn calculate(&self, recipe: &Recipe) -> RecipeNutrition {
        let language = recipe.language.as_deref();
        let mut total = Macros::zero();
        for line in recipe.lines() {
            total += self.line_nutrition(line, language).await;
        }
        let total = total.rounded(1);

        RecipeNutrition {
            total,
            per_serving: total.per_serving(recipe.servings_original),
            servings: recipe.servings_original,
        }
    }

    async fn line_nutrition(&self, line: &RecipeIngredientLine, language: Option<&str>) -> Macros {
        let Some(amount) = line.amount.filter(|a| a.is_finite() && *a > 0.0) else {
            return Macros::zero();
        };
        let (per_100g, ingredient_id) = self.line_per_100g(line, language).await;
        let grams = self.line_grams(line, ingredient_id, amount).await;
        per_100g.for_grams(grams).rounded(1)
    }

    async fn line_per_100g(
        &self,
        line: &RecipeIngredientLine,
        language: Option<&str>,
    ) -> (Macros, Option<Uuid>) {
        if let Some(id) = line.ingredient_id {
            match self.store.get_nutrition(id).await {
                Ok(Some(record)) => return (record.per_100g, Some(id)),
                Ok(None) => {}
                Err(e) => warn!(ingredient_id = %id, error = %e, "Linked nutrition lookup failed"),
            }
        }
        let lookup = self.lookup_ingredient(&line.name, language).await;
        let id = line
            .ingredient_id
            .or_else(|| lookup.provenance.map(|p| p.ingredient_id));
        (lookup.per_100g, id)
    }

    async fn line_grams(
        &self,
        line: &RecipeIngredientLine,
        ingredient_id: Option<Uuid>,
        amount: f64,
    ) -> f64 {
        if let (Some(id), Some(unit)) = (ingredient_id, line.unit.as_deref()) {
            let unit = canonical_unit(unit);
            match self.store.find_unit_override(id, &unit).await {
                Ok(Some(conversion)) => return amount * conversion.grams_per_unit,
                Ok(None) => {}
                Err(e) => warn!(unit = %unit, error = %e, "Unit override lookup failed"),
            }
        }
        estimate_grams(&self.graph, &line.name, Some(amount), line.unit.as_deref())
    }
}
