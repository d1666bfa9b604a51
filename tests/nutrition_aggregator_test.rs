// ABOUTME: Integration tests for tiered nutrition lookup and recipe nutrition totals
// ABOUTME: Covers stored, external and estimated tiers, persistence, concurrency and unit overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{Reply, ScriptedLlm, ScriptedNutritionSource};
use larder::config::MatchingConfig;
use larder::database::{InMemoryStore, IngredientStore};
use larder::errors::{ErrorCode, ProviderError};
use larder::external::NutritionSource;
use larder::intelligence::{NutritionAggregator, NutritionEstimator};
use larder::llm::LlmProvider;
use larder::models::{DataSource, IngredientCategory, Macros, Recipe, RecipeIngredientLine};
use larder::Larder;

const EPS: f64 = 1e-9;

fn assert_macros(actual: Macros, expected: Macros) {
    let pairs = [
        ("calories", actual.calories, expected.calories),
        ("protein_g", actual.protein_g, expected.protein_g),
        ("carbs_g", actual.carbs_g, expected.carbs_g),
        ("fat_g", actual.fat_g, expected.fat_g),
        ("fiber_g", actual.fiber_g, expected.fiber_g),
    ];
    for (field, got, want) in pairs {
        assert!((got - want).abs() < EPS, "{field}: expected {want}, got {got}");
    }
}

fn larder_with(
    store: &Arc<InMemoryStore>,
    source: Option<&Arc<ScriptedNutritionSource>>,
    llm: Option<&Arc<ScriptedLlm>>,
) -> Larder {
    let source: Option<Arc<dyn NutritionSource>> =
        source.map(|s| Arc::clone(s) as Arc<dyn NutritionSource>);
    let llm: Option<Arc<dyn LlmProvider>> = llm.map(|l| Arc::clone(l) as Arc<dyn LlmProvider>);
    Larder::new(store.clone(), common::fast_config(), source, llm)
}

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = common::memory_store();
    common::seed_catalogue(store.as_ref()).await;
    store
}

const KOHLRABI_ESTIMATE: &str =
    r#"{"calories": 27, "protein_g": 1.7, "carbs_g": 6.2, "fat_g": 0.1, "fiber_g": 3.6}"#;

// =============================================================================
// Stored tier
// =============================================================================

#[tokio::test]
async fn test_stored_exact_name_and_plural() {
    let store = seeded_store().await;
    let larder = larder_with(&store, None, None);

    let lookup = larder.lookup_nutrition("Tomatoes", None).await;
    assert_macros(lookup.per_100g, Macros::new(18.0, 0.9, 3.9, 0.2, 1.2));
    let provenance = lookup.provenance.unwrap();
    assert_eq!(provenance.data_source, DataSource::Stored);
    assert!((provenance.confidence - 1.0).abs() < EPS);
}

#[tokio::test]
async fn test_plural_seeded_ingredient_is_found_by_plural_lookup() {
    let store = common::memory_store();
    let seeded = common::seed_ingredient(
        store.as_ref(),
        "Tomatoes",
        IngredientCategory::Vegetable,
        Some(Macros::new(18.0, 0.9, 3.9, 0.2, 1.2)),
        &[],
    )
    .await;
    assert_eq!(seeded.canonical_name, "tomato");
    let source = Arc::new(ScriptedNutritionSource::new());
    let larder = larder_with(&store, Some(&source), None);

    let lookup = larder.lookup_nutrition("tomatoes", None).await;
    let provenance = lookup.provenance.unwrap();
    assert_eq!(provenance.data_source, DataSource::Stored);
    assert_eq!(provenance.ingredient_id, seeded.id);
    assert_eq!(source.calls(), 0);
    assert_eq!(store.ingredient_count().await, 1);
}

#[tokio::test]
async fn test_stored_alias_with_language() {
    let store = seeded_store().await;
    let larder = larder_with(&store, None, None);

    let lookup = larder.lookup_nutrition("Poulet", Some("fr")).await;
    assert!((lookup.per_100g.calories - 239.0).abs() < EPS);

    // alias languages are a preference, not a filter
    let lookup = larder.lookup_nutrition("pollo", Some("fr")).await;
    assert!((lookup.per_100g.calories - 239.0).abs() < EPS);
}

#[tokio::test]
async fn test_fuzzy_stored_match_creates_nothing() {
    let store = seeded_store().await;
    let source = Arc::new(ScriptedNutritionSource::new());
    let larder = larder_with(&store, Some(&source), None);

    let lookup = larder.lookup_nutrition("chiken", None).await;
    assert!((lookup.per_100g.calories - 239.0).abs() < EPS);
    assert_eq!(lookup.provenance.unwrap().data_source, DataSource::Stored);
    assert_eq!(source.calls(), 0);
    assert_eq!(store.ingredient_count().await, 6);
}

#[tokio::test]
async fn test_blank_name_is_empty() {
    let store = seeded_store().await;
    let larder = larder_with(&store, None, None);
    let lookup = larder.lookup_nutrition("   ", None).await;
    assert_macros(lookup.per_100g, Macros::zero());
    assert!(lookup.provenance.is_none());
    assert_eq!(store.ingredient_count().await, 6);
}

// =============================================================================
// External tier
// =============================================================================

#[tokio::test]
async fn test_external_result_is_rescaled_and_persisted() {
    let store = seeded_store().await;
    let source = Arc::new(ScriptedNutritionSource::new().with_food(
        "100g green pepper",
        "green bell pepper",
        119.0,
        Macros::new(23.8, 1.0, 5.5, 0.2, 2.0),
    ));
    let larder = larder_with(&store, Some(&source), None);

    let lookup = larder.lookup_nutrition("Green Peppers", Some("en")).await;
    assert_macros(lookup.per_100g, Macros::new(20.0, 0.8, 4.6, 0.2, 1.7));
    let provenance = lookup.provenance.unwrap();
    assert_eq!(provenance.data_source, DataSource::ExternalApi);
    assert!((provenance.confidence - 1.0).abs() < EPS);
    assert_eq!(source.queries(), ["100g green pepper"]);

    let ingredient = store.get_ingredient(provenance.ingredient_id).await.unwrap().unwrap();
    assert_eq!(ingredient.canonical_name, "green pepper");
    let aliases = store.aliases_for(ingredient.id).await.unwrap();
    assert_eq!(aliases.len(), 1);
    assert_eq!(aliases[0].alias, "green peppers");
    assert_eq!(aliases[0].language.as_deref(), Some("en"));

    // served from the store from now on
    let again = larder.lookup_nutrition("green peppers", None).await;
    assert_eq!(again.provenance.map(|p| p.ingredient_id), Some(ingredient.id));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_external_failure_falls_through_to_estimate() {
    let store = seeded_store().await;
    let source = Arc::new(ScriptedNutritionSource::new().failing(|| ProviderError::Network {
        provider: "nutritionix".into(),
        message: "connection reset".into(),
    }));
    let llm = Arc::new(ScriptedLlm::answering(KOHLRABI_ESTIMATE));
    let larder = larder_with(&store, Some(&source), Some(&llm));

    let lookup = larder.lookup_nutrition("kohlrabi", None).await;
    assert_macros(lookup.per_100g, Macros::new(27.0, 1.7, 6.2, 0.1, 3.6));
    assert_eq!(source.calls(), 1);
    assert_eq!(llm.calls(), 1);
}

// =============================================================================
// Estimate tier
// =============================================================================

#[tokio::test]
async fn test_estimate_is_persisted_with_reduced_confidence() {
    let store = seeded_store().await;
    let source = Arc::new(ScriptedNutritionSource::new());
    let llm = Arc::new(ScriptedLlm::answering(KOHLRABI_ESTIMATE));
    let larder = larder_with(&store, Some(&source), Some(&llm));

    let lookup = larder.lookup_nutrition("Kohlrabi", None).await;
    let provenance = lookup.provenance.unwrap();
    assert_eq!(provenance.data_source, DataSource::GenerativeEstimate);
    assert!((provenance.confidence - 0.7).abs() < EPS);
    assert_eq!(llm.prompts(), ["Estimate nutrition per 100g for: kohlrabi"]);

    let record = store.get_nutrition(provenance.ingredient_id).await.unwrap().unwrap();
    assert_macros(record.per_100g, lookup.per_100g);
}

#[tokio::test]
async fn test_no_provider_uses_fallback_defaults() {
    let store = seeded_store().await;
    let larder = larder_with(&store, None, None);

    let lookup = larder.lookup_nutrition("dragonfruit", None).await;
    assert_macros(lookup.per_100g, Macros::new(100.0, 2.0, 15.0, 2.0, 1.0));
    let provenance = lookup.provenance.unwrap();
    assert_eq!(provenance.data_source, DataSource::GenerativeEstimate);
    assert_eq!(store.ingredient_count().await, 7);
}

#[tokio::test]
async fn test_unparseable_estimate_uses_fallback_defaults() {
    let store = seeded_store().await;
    let llm = Arc::new(ScriptedLlm::answering("I'd guess it's fairly healthy."));
    let larder = larder_with(&store, None, Some(&llm));

    let lookup = larder.lookup_nutrition("romanesco", None).await;
    assert_macros(lookup.per_100g, Macros::fallback());
}

#[tokio::test]
async fn test_transient_llm_errors_are_retried() {
    let store = seeded_store().await;
    let llm = Arc::new(ScriptedLlm::new(vec![
        Reply::Fail(ErrorCode::ExternalServiceUnavailable),
        Reply::Fail(ErrorCode::ExternalRateLimited),
        Reply::Text(KOHLRABI_ESTIMATE),
    ]));
    let larder = larder_with(&store, None, Some(&llm));

    let lookup = larder.lookup_nutrition("kohlrabi", None).await;
    assert!((lookup.per_100g.calories - 27.0).abs() < EPS);
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_auth_failures_are_not_retried() {
    let store = seeded_store().await;
    let llm = Arc::new(ScriptedLlm::new(vec![Reply::Fail(ErrorCode::ExternalAuthFailed)]));
    let larder = larder_with(&store, None, Some(&llm));

    let lookup = larder.lookup_nutrition("kohlrabi", None).await;
    assert_macros(lookup.per_100g, Macros::fallback());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_retries_stop_at_the_limit() {
    let store = seeded_store().await;
    let llm = Arc::new(ScriptedLlm::new(vec![Reply::Fail(ErrorCode::ExternalServiceError)]));
    let larder = larder_with(&store, None, Some(&llm));

    let lookup = larder.lookup_nutrition("kohlrabi", None).await;
    assert_macros(lookup.per_100g, Macros::fallback());
    // first attempt plus three retries
    assert_eq!(llm.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_estimator_backs_off_between_attempts() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        Reply::Fail(ErrorCode::ExternalServiceUnavailable),
        Reply::Text(KOHLRABI_ESTIMATE),
    ]));
    let estimator = NutritionEstimator::new(
        Some(Arc::clone(&llm) as Arc<dyn LlmProvider>),
        larder::config::EstimatorConfig::default(),
    );

    let started = tokio::time::Instant::now();
    let macros = estimator.estimate("kohlrabi").await;
    assert!((macros.calories - 27.0).abs() < EPS);
    // 1 s spacing between calls is covered by the 2 s backoff
    assert!(started.elapsed() >= std::time::Duration::from_millis(2000));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_lookups_create_one_ingredient() {
    let store = seeded_store().await;
    let source = Arc::new(ScriptedNutritionSource::new().with_food(
        "100g jackfruit",
        "jackfruit",
        100.0,
        Macros::new(95.0, 1.7, 23.2, 0.6, 1.5),
    ));
    let aggregator = Arc::new(NutritionAggregator::new(
        store.clone(),
        Some(Arc::clone(&source) as Arc<dyn NutritionSource>),
        NutritionEstimator::disabled(),
        MatchingConfig::default(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let aggregator = Arc::clone(&aggregator);
            let name = if i % 2 == 0 { "Jackfruit" } else { "jackfruits" };
            tokio::spawn(async move { aggregator.lookup_ingredient(name, None).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let lookup = handle.await.unwrap();
        assert!((lookup.per_100g.calories - 95.0).abs() < EPS);
        ids.push(lookup.provenance.unwrap().ingredient_id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.ingredient_count().await, 7);
}

// =============================================================================
// Recipe totals
// =============================================================================

#[tokio::test]
async fn test_recipe_totals_and_per_serving() {
    let store = seeded_store().await;
    let larder = larder_with(&store, None, None);

    let mut salt = RecipeIngredientLine::new("salt", "salt", 0.0, None);
    salt.amount = None;
    let recipe = Recipe::new("Chicken and tomatoes", 2.0).with_group(
        None,
        vec![
            RecipeIngredientLine::new("chicken", "chicken breast", 300.0, Some("g")),
            RecipeIngredientLine::new("tomatoes", "Tomatoes", 2.0, None),
            salt,
        ],
    );

    let nutrition = larder.calculate_recipe_nutrition(&recipe).await;
    assert_macros(nutrition.total, Macros::new(531.0, 94.8, 7.8, 11.2, 2.4));
    assert_macros(nutrition.per_serving, Macros::new(266.0, 47.4, 3.9, 5.6, 1.2));
    assert!((nutrition.servings - 2.0).abs() < EPS);
    // salt had no amount and was never looked up
    assert_eq!(store.ingredient_count().await, 6);
}

#[tokio::test]
async fn test_linked_ingredient_skips_name_lookup() {
    let store = seeded_store().await;
    let chicken = store.find_by_name("chicken").await.unwrap().unwrap();
    let larder = larder_with(&store, None, None);

    let recipe = Recipe::new("Mystery", 1.0).with_group(
        None,
        vec![RecipeIngredientLine::new("m", "house special", 100.0, Some("g"))
            .with_ingredient(chicken.id)],
    );
    let nutrition = larder.calculate_recipe_nutrition(&recipe).await;
    assert!((nutrition.total.calories - 239.0).abs() < EPS);
    assert_eq!(store.ingredient_count().await, 6);
}

#[tokio::test]
async fn test_unit_override_takes_precedence_over_estimates() {
    let store = seeded_store().await;
    let egg = store.find_by_name("egg").await.unwrap().unwrap();
    let larder = larder_with(&store, None, None);
    let recipe = Recipe::new("Eggs", 1.0).with_group(
        None,
        vec![RecipeIngredientLine::new("eggs", "eggs", 2.0, Some("whole"))],
    );

    // default item weight: 2 x 50 g
    let before = larder.calculate_recipe_nutrition(&recipe).await;
    assert!((before.total.calories - 143.0).abs() < EPS);

    let saved = larder.add_unit_override(egg.id, "Whole", 60.0).await.unwrap();
    assert_eq!(saved.unit, "whole");

    let after = larder.calculate_recipe_nutrition(&recipe).await;
    assert!((after.total.calories - 171.6).abs() < EPS);
}

#[tokio::test]
async fn test_unit_override_validation() {
    let store = seeded_store().await;
    let egg = store.find_by_name("egg").await.unwrap().unwrap();
    let larder = larder_with(&store, None, None);

    let err = larder.add_unit_override(egg.id, "whole", 0.0).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    let err = larder.add_unit_override(egg.id, "  ", 50.0).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    let err = larder
        .add_unit_override(uuid::Uuid::new_v4(), "whole", 50.0)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_fractional_servings_divide_by_one() {
    let store = seeded_store().await;
    let larder = larder_with(&store, None, None);
    let recipe = Recipe::new("Snack", 0.5).with_group(
        None,
        vec![RecipeIngredientLine::new("c", "chicken", 50.0, Some("g"))],
    );
    let nutrition = larder.calculate_recipe_nutrition(&recipe).await;
    assert!((nutrition.total.calories - 119.5).abs() < EPS);
    assert!((nutrition.per_serving.calories - 120.0).abs() < EPS);
}
