// ABOUTME: Larder facade composing the store, resolver, nutrition aggregator, unit graph and scaler
// ABOUTME: Single entry point for the public ingredient, nutrition, conversion and scaling operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Larder
//!
//! ```rust,no_run
//! use larder::config::LarderConfig;
//! use larder::Larder;
//!
//! # async fn example() -> larder::errors::AppResult<()> {
//! let larder = Larder::from_config(LarderConfig::from_env()).await?;
//! let lookup = larder.lookup_nutrition("cherry tomatoes", Some("en")).await;
//! println!("{} kcal per 100 g", lookup.per_100g.calories);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use larder_core::errors::{AppError, AppResult};
use larder_core::models::{Ingredient, Recipe, UnitConversionOverride};
use larder_culinary::units::canonical_unit;
use larder_culinary::{RecipeScaler, ScaledRecipe, ScalingPolicy, UnitGraph};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::LarderConfig;
use crate::database::{open_store, IngredientStore};
use crate::external::{NutritionSource, NutritionixClient};
use crate::intelligence::{
    IngredientResolver, IngredientSuggestions, NutritionAggregator, NutritionEstimator,
    NutritionLookup, RecipeNutrition,
};
use crate::llm::{provider_from_config, LlmProvider};

/// Ingredient, nutrition, conversion and scaling operations over one store
pub struct Larder {
    store: Arc<dyn IngredientStore>,
    resolver: IngredientResolver,
    aggregator: NutritionAggregator,
    graph: Arc<UnitGraph>,
    scaling: ScalingPolicy,
    config: LarderConfig,
}

impl Larder {
    /// Compose a facade from already-built collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn IngredientStore>,
        config: LarderConfig,
        source: Option<Arc<dyn NutritionSource>>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let graph = Arc::new(UnitGraph::standard_owned());
        let estimator = NutritionEstimator::new(llm, config.estimator.clone());
        let aggregator =
            NutritionAggregator::new(Arc::clone(&store), source, estimator, config.matching)
                .with_graph(Arc::clone(&graph));
        Self {
            resolver: IngredientResolver::new(Arc::clone(&store), config.matching),
            store,
            aggregator,
            graph,
            scaling: config.scaling,
            config,
        }
    }

    /// Open the configured store and build the configured providers
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or a selected provider
    /// is missing credentials
    pub async fn from_config(config: LarderConfig) -> AppResult<Self> {
        let store = open_store(&config.database).await?;
        let source: Option<Arc<dyn NutritionSource>> = if config.nutritionix.is_configured() {
            Some(Arc::new(NutritionixClient::new(config.nutritionix.clone())?))
        } else {
            None
        };
        let llm = provider_from_config(&config.estimator)?;

        info!(
            database = %config.database.url,
            nutritionix = source.is_some(),
            llm = llm.as_ref().map_or("none", |p| p.name()),
            "Larder ready"
        );
        Ok(Self::new(store, config, source, llm))
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &LarderConfig {
        &self.config
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn IngredientStore> {
        &self.store
    }

    /// Resolver used by search and resolution
    #[must_use]
    pub const fn resolver(&self) -> &IngredientResolver {
        &self.resolver
    }

    /// Unit graph used for conversions
    #[must_use]
    pub fn graph(&self) -> &UnitGraph {
        &self.graph
    }

    /// Resolve a free-text name to one ingredient
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails while reading
    pub async fn resolve_ingredient(&self, name: &str) -> AppResult<Option<Ingredient>> {
        self.resolver.resolve(name, None).await
    }

    /// Ingredient search, best first
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails
    pub async fn search_ingredients(&self, query: &str, limit: usize) -> AppResult<Vec<Ingredient>> {
        self.resolver.search(query, limit).await
    }

    /// Exact match plus suggestions
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails
    pub async fn find_or_suggest(&self, query: &str) -> AppResult<IngredientSuggestions> {
        self.resolver.find_or_suggest(query).await
    }

    /// Per-100g nutrition for a name; never fails
    pub async fn lookup_nutrition(&self, name: &str, language: Option<&str>) -> NutritionLookup {
        self.aggregator.lookup_ingredient(name, language).await
    }

    /// Total and per-serving nutrition; never fails
    pub async fn calculate_recipe_nutrition(&self, recipe: &Recipe) -> RecipeNutrition {
        self.aggregator.calculate(recipe).await
    }

    /// Convert between units; unconnected units return `amount` unchanged
    #[must_use]
    pub fn convert_unit(&self, amount: f64, from: &str, to: &str) -> f64 {
        self.graph.convert(amount, from, to)
    }

    /// Rescale to `target_servings`
    #[must_use]
    pub fn scale_recipe_by_servings(&self, recipe: &Recipe, target_servings: f64) -> ScaledRecipe {
        self.scaler(recipe).scale_by_servings(target_servings)
    }

    /// Rescale so the anchor line becomes `target_amount` of `target_unit`.
    ///
    /// `None` when no line has id `anchor_id`.
    #[must_use]
    pub fn scale_recipe_by_ingredient(
        &self,
        recipe: &Recipe,
        anchor_id: &str,
        target_amount: f64,
        target_unit: Option<&str>,
    ) -> Option<ScaledRecipe> {
        self.scaler(recipe)
            .scale_by_ingredient(anchor_id, target_amount, target_unit)
    }

    fn scaler<'a>(&'a self, recipe: &'a Recipe) -> RecipeScaler<'a> {
        RecipeScaler::new(recipe)
            .with_policy(self.scaling)
            .with_graph(&self.graph)
    }

    /// Record how many grams one `unit` of an ingredient weighs
    ///
    /// # Errors
    ///
    /// Returns an error if the weight is not positive, the ingredient does not
    /// exist, or the store fails
    #[instrument(skip(self))]
    pub async fn add_unit_override(
        &self,
        ingredient_id: Uuid,
        unit: &str,
        grams_per_unit: f64,
    ) -> AppResult<UnitConversionOverride> {
        if !grams_per_unit.is_finite() || grams_per_unit <= 0.0 {
            return Err(AppError::invalid_input(format!(
                "grams per unit must be positive, got {grams_per_unit}"
            )));
        }
        let unit = canonical_unit(unit);
        if unit.is_empty() {
            return Err(AppError::invalid_input("unit must not be blank"));
        }
        if self.store.get_ingredient(ingredient_id).await?.is_none() {
            return Err(AppError::not_found(format!("ingredient {ingredient_id}")));
        }

        let conversion = UnitConversionOverride {
            ingredient_id,
            unit,
            grams_per_unit,
        };
        self.store.save_unit_override(&conversion).await?;
        info!(unit = %conversion.unit, grams_per_unit, "Saved unit override");
        Ok(conversion)
    }
}
