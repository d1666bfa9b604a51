// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Provides quiet logging, seeded stores and scripted nutrition and LLM providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `larder`

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use larder::config::{EstimatorConfig, LarderConfig};
use larder::database::{IngredientStore, InMemoryStore, SqliteStore};
use larder::errors::{AppError, ErrorCode, ProviderError};
use larder::external::{FoodMatch, NutritionSource};
use larder::llm::{ChatRequest, ChatResponse, LlmProvider};
use larder::models::{
    AliasType, DataSource, Ingredient, IngredientAlias, IngredientCategory, Macros,
    NutritionRecord,
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Empty in-memory store
pub fn memory_store() -> Arc<InMemoryStore> {
    init_test_logging();
    Arc::new(InMemoryStore::new())
}

/// Migrated in-memory SQLite store
pub async fn sqlite_memory_store() -> SqliteStore {
    init_test_logging();
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    store
}

/// Config with estimator retries that finish instantly
pub fn fast_config() -> LarderConfig {
    LarderConfig {
        estimator: EstimatorConfig {
            min_interval_ms: 0,
            backoff_base_ms: 1,
            ..EstimatorConfig::default()
        },
        ..LarderConfig::default()
    }
}

/// Insert an ingredient with optional per-100g data and aliases
pub async fn seed_ingredient(
    store: &dyn IngredientStore,
    name: &str,
    category: IngredientCategory,
    per_100g: Option<Macros>,
    aliases: &[(&str, Option<&str>)],
) -> Ingredient {
    let ingredient = store
        .create_ingredient(&Ingredient::new(name, category))
        .await
        .unwrap();
    if let Some(macros) = per_100g {
        store
            .create_nutrition(&NutritionRecord::new(
                ingredient.id,
                macros,
                DataSource::Stored,
                1.0,
            ))
            .await
            .unwrap();
    }
    for (alias, language) in aliases {
        store
            .create_alias(&IngredientAlias::new(
                ingredient.id,
                *alias,
                *language,
                AliasType::Synonym,
            ))
            .await
            .unwrap();
    }
    ingredient
}

/// A small catalogue shared by resolver and aggregator tests
pub async fn seed_catalogue(store: &dyn IngredientStore) -> HashMap<&'static str, Ingredient> {
    let rows: [(&str, IngredientCategory, Macros, &[(&str, Option<&str>)]); 6] = [
        (
            "chicken",
            IngredientCategory::Protein,
            Macros::new(239.0, 27.3, 0.0, 13.6, 0.0),
            &[("poulet", Some("fr")), ("pollo", Some("es"))],
        ),
        (
            "chicken breast",
            IngredientCategory::Protein,
            Macros::new(165.0, 31.0, 0.0, 3.6, 0.0),
            &[],
        ),
        (
            "tomato",
            IngredientCategory::Vegetable,
            Macros::new(18.0, 0.9, 3.9, 0.2, 1.2),
            &[("tomate", Some("fr"))],
        ),
        (
            "all-purpose flour",
            IngredientCategory::Grain,
            Macros::new(364.0, 10.3, 76.3, 1.0, 2.7),
            &[("flour", None)],
        ),
        (
            "parmesan cheese",
            IngredientCategory::Dairy,
            Macros::new(431.0, 38.0, 4.1, 29.0, 0.0),
            &[],
        ),
        (
            "egg",
            IngredientCategory::Protein,
            Macros::new(143.0, 12.6, 0.7, 9.5, 0.0),
            &[],
        ),
    ];

    let mut seeded = HashMap::new();
    for (name, category, macros, aliases) in rows {
        let ingredient = seed_ingredient(store, name, category, Some(macros), aliases).await;
        seeded.insert(name, ingredient);
    }
    seeded
}

// ============================================================================
// Scripted nutrition source
// ============================================================================

/// Nutrition source answering from a fixed table keyed by query
#[derive(Default)]
pub struct ScriptedNutritionSource {
    foods: HashMap<String, Vec<FoodMatch>>,
    failure: Option<fn() -> ProviderError>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedNutritionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with one food
    pub fn with_food(mut self, query: &str, food_name: &str, grams: f64, per_serving: Macros) -> Self {
        self.foods.entry(query.to_owned()).or_default().push(FoodMatch {
            food_name: food_name.to_owned(),
            serving_weight_grams: grams,
            per_serving,
        });
        self
    }

    /// Fail every search
    pub fn failing(mut self, failure: fn() -> ProviderError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NutritionSource for ScriptedNutritionSource {
    async fn search(&self, query: &str) -> Result<Vec<FoodMatch>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_owned());
        // let concurrent callers overlap
        tokio::task::yield_now().await;
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(self.foods.get(query).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Scripted LLM provider
// ============================================================================

/// One scripted completion outcome
#[derive(Clone, Copy)]
pub enum Reply {
    Text(&'static str),
    Fail(ErrorCode),
}

/// LLM provider replaying a queue of outcomes; the last one repeats
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(text: &'static str) -> Self {
        Self::new(vec![Reply::Text(text)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(last) = request.messages.last() {
            self.prompts.lock().unwrap().push(last.content.clone());
        }
        let outcome = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().copied()
            }
        };
        match outcome {
            Some(Reply::Text(text)) => Ok(ChatResponse {
                content: text.to_owned(),
                model: "scripted-1".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            Some(Reply::Fail(code)) => Err(AppError::new(code, "scripted failure")),
            None => Err(AppError::internal("no scripted reply")),
        }
    }
}

// ============================================================================
// Local HTTP upstream
// ============================================================================

/// Serve `router` on an ephemeral local port; returns its base URL
pub async fn spawn_upstream(router: axum::Router) -> String {
    init_test_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
