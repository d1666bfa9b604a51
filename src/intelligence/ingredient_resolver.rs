// ABOUTME: Maps free-text ingredient names to canonical ingredients through a matching cascade
// ABOUTME: Exact name, exact alias, prefix, then trigram similarity; resolve() also learns aliases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Ingredient Resolver
//!
//! `search` stops at the first stage that finds anything:
//!
//! 1. exact canonical name
//! 2. exact alias (optionally scoped to a language)
//! 3. prefix over canonical names, then aliases
//! 4. trigram similarity over canonical names and aliases, ranked by each
//!    ingredient's best score
//!
//! Nothing found is an empty list, never an error.

use std::sync::Arc;

use larder_core::errors::AppResult;
use larder_core::models::{AliasType, Ingredient, IngredientAlias};
use larder_culinary::similarity::trigram_similarity;
use larder_culinary::text::{normalize_ingredient_name, normalize_query};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::MatchingConfig;
use crate::database::{dedup_ingredients, IngredientStore};

/// Result of [`IngredientResolver::find_or_suggest`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientSuggestions {
    /// Ingredient the query names exactly, by canonical name or alias
    pub exact_match: Option<Ingredient>,
    /// Search results, best first
    pub suggestions: Vec<Ingredient>,
}

/// Alias type for a surface form accepted as `canonical`: prefixes of the
/// canonical name are synonyms, anything else reached by similarity is a misspelling
fn learned_alias_type(surface: &str, canonical: &str) -> AliasType {
    if canonical.to_lowercase().starts_with(surface) {
        AliasType::Synonym
    } else {
        AliasType::Misspelling
    }
}

/// Ingredient search and resolution over an [`IngredientStore`]
pub struct IngredientResolver {
    store: Arc<dyn IngredientStore>,
    config: MatchingConfig,
}

impl IngredientResolver {
    /// Resolver over `store`
    #[must_use]
    pub fn new(store: Arc<dyn IngredientStore>, config: MatchingConfig) -> Self {
        Self { store, config }
    }

    /// Matching thresholds in use
    #[must_use]
    pub const fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Search in any language
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails
    pub async fn search<'q>(
        &self,
        query: impl Into<Option<&'q str>> + Send,
        limit: usize,
    ) -> AppResult<Vec<Ingredient>> {
        self.search_in_language(query, None, limit).await
    }

    /// Search with alias matches narrowed to `language`
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails
    pub async fn search_in_language<'q>(
        &self,
        query: impl Into<Option<&'q str>> + Send,
        language: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Ingredient>> {
        let Some(normalized) = query.into().map(normalize_query).filter(|q| !q.is_empty())
        else {
            return Ok(Vec::new());
        };
        self.staged_search(&normalized, language, limit).await
    }

    #[instrument(skip(self))]
    async fn staged_search(
        &self,
        normalized: &str,
        language: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Ingredient>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(found) = self.store.find_by_name(normalized).await? {
            return Ok(vec![found]);
        }
        if let Some(found) = self.store.find_by_alias(normalized, language).await? {
            return Ok(vec![found]);
        }

        let mut prefixed = self.store.prefix_by_name(normalized, limit).await?;
        prefixed.extend(self.store.prefix_by_alias(normalized, language, limit).await?);
        let mut prefixed = dedup_ingredients(prefixed);
        if !prefixed.is_empty() {
            prefixed.truncate(limit);
            debug!(count = prefixed.len(), "Prefix matches");
            return Ok(prefixed);
        }

        let similar = self.similarity_search(normalized, language, limit).await?;
        debug!(count = similar.len(), "Similarity matches");
        Ok(similar.into_iter().map(|(ingredient, _)| ingredient).collect())
    }

    /// Trigram hits over names and aliases, ranked by each ingredient's best score
    async fn similarity_search(
        &self,
        normalized: &str,
        language: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>> {
        let min = self.config.min_similarity;
        let mut hits = self.store.similar_names(normalized, min, limit).await?;
        hits.extend(
            self.store
                .similar_aliases(normalized, language, min, limit)
                .await?,
        );
        let candidates = dedup_ingredients(hits.into_iter().map(|(i, _)| i).collect());

        let mut ranked = Vec::with_capacity(candidates.len());
        for ingredient in candidates {
            let best = self.best_similarity(&ingredient, normalized).await?;
            ranked.push((ingredient, best));
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Highest trigram similarity between `query` and the ingredient's
    /// canonical name or any of its aliases
    ///
    /// # Errors
    ///
    /// Returns an error if the aliases cannot be loaded
    pub async fn best_similarity(&self, ingredient: &Ingredient, query: &str) -> AppResult<f64> {
        let query = normalize_query(query);
        let canonical = trigram_similarity(&ingredient.canonical_name.to_lowercase(), &query);
        let aliases = self.store.aliases_for(ingredient.id).await?;
        Ok(aliases
            .iter()
            .map(|a| trigram_similarity(&a.alias.to_lowercase(), &query))
            .fold(canonical, f64::max))
    }

    /// Exact match plus suggestions for `query`
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails
    pub async fn find_or_suggest(&self, query: &str) -> AppResult<IngredientSuggestions> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Ok(IngredientSuggestions::default());
        }

        let suggestions = self.search(query, self.config.suggest_limit).await?;
        let exact_match = match suggestions.first() {
            Some(top) if top.canonical_name.to_lowercase() == normalized => Some(top.clone()),
            _ => self.store.find_by_alias(&normalized, None).await?,
        };

        Ok(IngredientSuggestions {
            exact_match,
            suggestions,
        })
    }

    /// Resolve a surface-form name to one ingredient, recording the surface
    /// form as an alias when it differs from the canonical name.
    ///
    /// Similarity matches are accepted only at or above the exact-like
    /// threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails while reading
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str, language: Option<&str>) -> AppResult<Option<Ingredient>> {
        let surface = normalize_query(name);
        let singular = normalize_ingredient_name(name);
        if surface.is_empty() || singular.is_empty() {
            return Ok(None);
        }

        if let Some(found) = self.store.find_by_name(&singular).await? {
            self.learn_alias(&surface, &found, language, AliasType::Synonym)
                .await;
            return Ok(Some(found));
        }
        if let Some(found) = self.store.find_by_alias(&singular, language).await? {
            self.learn_alias(&surface, &found, language, AliasType::Synonym)
                .await;
            return Ok(Some(found));
        }

        let suggestions = self.find_or_suggest(&surface).await?;
        if let Some(found) = suggestions.exact_match {
            self.learn_alias(&surface, &found, language, AliasType::Synonym)
                .await;
            return Ok(Some(found));
        }

        let Some(top) = suggestions.suggestions.into_iter().next() else {
            return Ok(None);
        };
        let best = self
            .best_similarity(&top, &surface)
            .await?
            .max(self.best_similarity(&top, &singular).await?);
        if best < self.config.exact_like_threshold {
            debug!(
                candidate = %top.canonical_name,
                similarity = best,
                "Top suggestion below exact-like threshold"
            );
            return Ok(None);
        }

        let alias_type = learned_alias_type(&surface, &top.canonical_name);
        self.learn_alias(&surface, &top, language, alias_type).await;
        Ok(Some(top))
    }

    /// Record `surface` as an alias of `ingredient` unless it is the canonical name.
    /// Failures are logged; resolution already succeeded.
    async fn learn_alias(
        &self,
        surface: &str,
        ingredient: &Ingredient,
        language: Option<&str>,
        alias_type: AliasType,
    ) {
        if surface.is_empty() || surface == ingredient.canonical_name.to_lowercase() {
            return;
        }
        let alias = IngredientAlias::new(ingredient.id, surface, language, alias_type);
        match self.store.create_alias(&alias).await {
            Ok(true) => info!(
                alias = %surface,
                canonical = %ingredient.canonical_name,
                alias_type = alias_type.as_str(),
                "Recorded ingredient alias"
            ),
            Ok(false) => {}
            Err(e) => warn!(alias = %surface, error = %e, "Failed to record ingredient alias"),
        }
    }
}
