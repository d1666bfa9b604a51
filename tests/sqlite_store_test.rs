// ABOUTME: Integration tests for the SQLite ingredient store on a file database
// ABOUTME: Covers persistence across reconnects, conflict handling, alias languages and unit overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::path::Path;

use larder::config::{DatabaseConfig, DatabaseUrl};
use larder::database::{open_store, IngredientStore, SqliteStore};
use larder::errors::ErrorCode;
use larder::models::{
    AliasType, DataSource, Ingredient, IngredientAlias, IngredientCategory, Macros,
    NutritionRecord, UnitConversionOverride,
};
use tempfile::TempDir;

async fn file_store(path: &Path) -> SqliteStore {
    common::init_test_logging();
    let store = SqliteStore::connect(&format!("sqlite:{}", path.display()))
        .await
        .unwrap();
    store.migrate().await.unwrap();
    store
}

#[tokio::test]
async fn test_data_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("larder.db");

    let id = {
        let store = file_store(&path).await;
        let chicken = common::seed_ingredient(
            &store,
            "Chicken",
            IngredientCategory::Protein,
            Some(Macros::new(239.0, 27.3, 0.0, 13.6, 0.0)),
            &[("poulet", Some("fr"))],
        )
        .await;
        store.pool().close().await;
        chicken.id
    };
    assert!(path.exists());

    let store = file_store(&path).await;
    let chicken = store.find_by_name("chicken").await.unwrap().unwrap();
    assert_eq!(chicken.id, id);
    assert_eq!(chicken.canonical_name, "chicken");
    assert_eq!(chicken.category, IngredientCategory::Protein);

    let record = store.get_nutrition(id).await.unwrap().unwrap();
    assert_eq!(record.data_source, DataSource::Stored);
    assert!((record.per_100g.calories - 239.0).abs() < f64::EPSILON);

    let via_alias = store.find_by_alias("poulet", Some("fr")).await.unwrap();
    assert_eq!(via_alias.map(|i| i.id), Some(id));
}

#[tokio::test]
async fn test_open_store_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.db");
    let config = DatabaseConfig::with_url(&format!("sqlite:{}", path.display()));
    assert!(matches!(config.url, DatabaseUrl::SQLite { .. }));

    let store = open_store(&config).await.unwrap();
    store
        .create_ingredient(&Ingredient::new("egg", IngredientCategory::Protein))
        .await
        .unwrap();
    assert!(path.exists());
    assert!(store.find_by_name("EGG").await.unwrap().is_some());
}

#[tokio::test]
async fn test_duplicate_ingredient_returns_existing_row() {
    let store = common::sqlite_memory_store().await;
    let first = store
        .create_ingredient(&Ingredient::new("Tomato", IngredientCategory::Vegetable))
        .await
        .unwrap();
    let second = store
        .create_ingredient(&Ingredient::new("  TOMATO ", IngredientCategory::Other))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.category, IngredientCategory::Vegetable);
}

#[tokio::test]
async fn test_alias_without_language_is_distinct_from_tagged_alias() {
    let store = common::sqlite_memory_store().await;
    let flour = common::seed_ingredient(&store, "all-purpose flour", IngredientCategory::Grain, None, &[]).await;

    let untagged = IngredientAlias::new(flour.id, "flour", None, AliasType::Synonym);
    let tagged = IngredientAlias::new(flour.id, "flour", Some("en"), AliasType::Synonym);
    assert!(store.create_alias(&untagged).await.unwrap());
    assert!(!store.create_alias(&untagged).await.unwrap());
    assert!(store.create_alias(&tagged).await.unwrap());

    let aliases = store.aliases_for(flour.id).await.unwrap();
    assert_eq!(aliases.len(), 2);
    assert!(aliases.iter().any(|a| a.language.is_none()));
    assert!(aliases.iter().any(|a| a.language.as_deref() == Some("en")));

    // no language filter matches either row
    assert!(store.find_by_alias("FLOUR", None).await.unwrap().is_some());
    assert!(store.find_by_alias("flour", Some("de")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_first_nutrition_record_wins() {
    let store = common::sqlite_memory_store().await;
    let egg = common::seed_ingredient(&store, "egg", IngredientCategory::Protein, None, &[]).await;

    let stored = store
        .create_nutrition(&NutritionRecord::new(
            egg.id,
            Macros::new(143.0, 12.6, 0.7, 9.5, 0.0),
            DataSource::ExternalApi,
            0.9,
        ))
        .await
        .unwrap();
    let again = store
        .create_nutrition(&NutritionRecord::new(
            egg.id,
            Macros::fallback(),
            DataSource::GenerativeEstimate,
            0.7,
        ))
        .await
        .unwrap();

    assert_eq!(again.data_source, DataSource::ExternalApi);
    assert!((again.per_100g.calories - stored.per_100g.calories).abs() < f64::EPSILON);
    assert!((again.confidence_score - 0.9).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_nutrition_for_unknown_ingredient_is_rejected() {
    let store = common::sqlite_memory_store().await;
    let orphan = NutritionRecord::new(uuid::Uuid::new_v4(), Macros::fallback(), DataSource::Stored, 1.0);
    let err = store.create_nutrition(&orphan).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);
}

#[tokio::test]
async fn test_unit_override_upserts() {
    let store = common::sqlite_memory_store().await;
    let egg = common::seed_ingredient(&store, "egg", IngredientCategory::Protein, None, &[]).await;

    let mut conversion = UnitConversionOverride {
        ingredient_id: egg.id,
        unit: "whole".to_owned(),
        grams_per_unit: 50.0,
    };
    store.save_unit_override(&conversion).await.unwrap();
    conversion.grams_per_unit = 60.0;
    store.save_unit_override(&conversion).await.unwrap();

    let found = store.find_unit_override(egg.id, "whole").await.unwrap().unwrap();
    assert!((found.grams_per_unit - 60.0).abs() < f64::EPSILON);
    assert!(store.find_unit_override(egg.id, "cup").await.unwrap().is_none());

    conversion.grams_per_unit = 0.0;
    let err = store.save_unit_override(&conversion).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_canonical_names_are_stored_singular() {
    let store = common::sqlite_memory_store().await;
    let plural = store
        .create_ingredient(&Ingredient::new("Tomatoes", IngredientCategory::Vegetable))
        .await
        .unwrap();
    assert_eq!(plural.canonical_name, "tomato");

    let singular = store
        .create_ingredient(&Ingredient::new("tomato", IngredientCategory::Other))
        .await
        .unwrap();
    assert_eq!(singular.id, plural.id);
    assert!(store.find_by_name("tomatoes").await.unwrap().is_none());

    let err = store
        .create_ingredient(&Ingredient::new(" %% ", IngredientCategory::Other))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_prefix_treats_like_wildcards_literally() {
    let store = common::sqlite_memory_store().await;
    common::seed_ingredient(
        &store,
        "dark chocolate",
        IngredientCategory::Other,
        None,
        &[("50% dark", None)],
    )
    .await;
    common::seed_ingredient(
        &store,
        "flour mix",
        IngredientCategory::Grain,
        None,
        &[("500g mix", None)],
    )
    .await;
    common::seed_ingredient(
        &store,
        "maple syrup",
        IngredientCategory::Other,
        None,
        &[("sugar_free syrup", None)],
    )
    .await;
    common::seed_ingredient(
        &store,
        "chewing gum",
        IngredientCategory::Other,
        None,
        &[("sugarless gum", None)],
    )
    .await;

    let hits = store.prefix_by_alias("50%", None, 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].canonical_name, "dark chocolate");

    let hits = store.prefix_by_alias("sugar_", None, 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].canonical_name, "maple syrup");

    assert!(store.prefix_by_name("%", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_similar_names_respects_threshold_and_limit() {
    let store = common::sqlite_memory_store().await;
    common::seed_catalogue(&store).await;

    let hits = store.similar_names("chiken", 0.3, 1).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0.canonical_name, "chicken");
    assert!(hits[0].1 > 0.3);

    assert!(store.similar_names("xyzzy", 0.3, 5).await.unwrap().is_empty());
}
