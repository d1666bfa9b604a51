// ABOUTME: SQLite implementation of the ingredient store using sqlx
// ABOUTME: Creates its schema on migrate and resolves insert conflicts by re-reading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larder_core::errors::{AppError, AppResult};
use larder_core::models::{
    AliasType, DataSource, Ingredient, IngredientAlias, IngredientCategory, Macros,
    NutritionRecord, UnitConversionOverride,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    canonical_form, dedup_ingredients, escape_like, rank_by_similarity, IngredientStore,
};

const INGREDIENT_COLUMNS: &str = "i.id, i.canonical_name, i.category, i.created_at";

/// Ingredient store persisted in SQLite
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Connect to `database_url`, creating the file if needed.
    ///
    /// In-memory databases get a single connection so every query sees the
    /// same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the database cannot be opened
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        debug!(database_url, max_connections, "Opened SQLite ingredient store");
        Ok(Self { pool })
    }

    /// Get a reference to the pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Create the tables if they do not exist
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id TEXT PRIMARY KEY,
                canonical_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                category TEXT NOT NULL DEFAULT 'other',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // language '' stands for "no language" so the unique pair also covers it
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_aliases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ingredient_id TEXT NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                alias TEXT NOT NULL COLLATE NOCASE,
                language TEXT NOT NULL DEFAULT '',
                alias_type TEXT NOT NULL DEFAULT 'synonym',
                UNIQUE (alias, language)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_nutrition (
                ingredient_id TEXT PRIMARY KEY REFERENCES ingredients(id) ON DELETE CASCADE,
                calories REAL NOT NULL,
                protein_g REAL NOT NULL,
                carbs_g REAL NOT NULL,
                fat_g REAL NOT NULL,
                fiber_g REAL NOT NULL,
                data_source TEXT NOT NULL,
                confidence_score REAL NOT NULL CHECK (confidence_score >= 0 AND confidence_score <= 1),
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_unit_conversions (
                ingredient_id TEXT NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                unit TEXT NOT NULL,
                grams_per_unit REAL NOT NULL CHECK (grams_per_unit > 0),
                PRIMARY KEY (ingredient_id, unit)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ingredient_aliases_ingredient ON ingredient_aliases(ingredient_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_ingredients(&self, query: &str, binds: &[&str]) -> AppResult<Vec<Ingredient>> {
        let mut statement = sqlx::query(query);
        for value in binds {
            statement = statement.bind(*value);
        }
        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_ingredient).collect()
    }

    async fn fetch_ingredient(&self, query: &str, binds: &[&str]) -> AppResult<Option<Ingredient>> {
        Ok(self.fetch_ingredients(query, binds).await?.into_iter().next())
    }
}

fn parse_uuid(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::database(format!("Invalid UUID '{raw}': {e}")))
}

fn row_to_ingredient(row: &SqliteRow) -> AppResult<Ingredient> {
    let id: String = row.try_get("id")?;
    let category: String = row.try_get("category")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Ingredient {
        id: parse_uuid(&id)?,
        canonical_name: row.try_get("canonical_name")?,
        category: IngredientCategory::parse(&category),
        created_at,
    })
}

fn row_to_nutrition(row: &SqliteRow) -> AppResult<NutritionRecord> {
    let id: String = row.try_get("ingredient_id")?;
    let source: String = row.try_get("data_source")?;
    Ok(NutritionRecord {
        ingredient_id: parse_uuid(&id)?,
        per_100g: Macros::new(
            row.try_get("calories")?,
            row.try_get("protein_g")?,
            row.try_get("carbs_g")?,
            row.try_get("fat_g")?,
            row.try_get("fiber_g")?,
        ),
        data_source: DataSource::parse(&source),
        confidence_score: row.try_get("confidence_score")?,
        created_at: row.try_get("created_at")?,
    })
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl IngredientStore for SqliteStore {
    async fn get_ingredient(&self, id: Uuid) -> AppResult<Option<Ingredient>> {
        let query = format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients i WHERE i.id = ?");
        self.fetch_ingredient(&query, &[&id.to_string()]).await
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Ingredient>> {
        let query =
            format!("SELECT {INGREDIENT_COLUMNS} FROM ingredients i WHERE i.canonical_name = ?");
        self.fetch_ingredient(&query, &[&name.trim().to_lowercase()]).await
    }

    async fn find_by_alias(
        &self,
        alias: &str,
        language: Option<&str>,
    ) -> AppResult<Option<Ingredient>> {
        let alias = alias.trim().to_lowercase();
        if let Some(language) = language {
            let query = format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredient_aliases a \
                 JOIN ingredients i ON i.id = a.ingredient_id \
                 WHERE a.alias = ? AND a.language = ? ORDER BY a.id LIMIT 1"
            );
            self.fetch_ingredient(&query, &[&alias, language]).await
        } else {
            let query = format!(
                "SELECT {INGREDIENT_COLUMNS} FROM ingredient_aliases a \
                 JOIN ingredients i ON i.id = a.ingredient_id \
                 WHERE a.alias = ? ORDER BY a.id LIMIT 1"
            );
            self.fetch_ingredient(&query, &[&alias]).await
        }
    }

    async fn prefix_by_name(&self, prefix: &str, limit: usize) -> AppResult<Vec<Ingredient>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let rows = sqlx::query(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients i \
             WHERE i.canonical_name LIKE ? ESCAPE '\\' ORDER BY i.canonical_name LIMIT ?"
        ))
        .bind(pattern)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_ingredient).collect()
    }

    async fn prefix_by_alias(
        &self,
        prefix: &str,
        language: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Ingredient>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let rows = sqlx::query(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredient_aliases a \
             JOIN ingredients i ON i.id = a.ingredient_id \
             WHERE a.alias LIKE ? ESCAPE '\\' AND (? IS NULL OR a.language = ?) \
             ORDER BY a.alias LIMIT ?"
        ))
        .bind(pattern)
        .bind(language)
        .bind(language)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;
        let ingredients = rows
            .iter()
            .map(row_to_ingredient)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(dedup_ingredients(ingredients))
    }

    #[instrument(skip(self), fields(store = "sqlite"))]
    async fn similar_names(
        &self,
        query: &str,
        min_score: f64,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>> {
        let rows = sqlx::query(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients i ORDER BY i.created_at, i.id"
        ))
        .fetch_all(&self.pool)
        .await?;
        let candidates = rows
            .iter()
            .map(|row| row_to_ingredient(row).map(|i| (i.clone(), i.canonical_name)))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(rank_by_similarity(candidates, query, min_score, limit))
    }

    #[instrument(skip(self), fields(store = "sqlite"))]
    async fn similar_aliases(
        &self,
        query: &str,
        language: Option<&str>,
        min_score: f64,
        limit: usize,
    ) -> AppResult<Vec<(Ingredient, f64)>> {
        let rows = sqlx::query(&format!(
            "SELECT {INGREDIENT_COLUMNS}, a.alias FROM ingredient_aliases a \
             JOIN ingredients i ON i.id = a.ingredient_id \
             WHERE (? IS NULL OR a.language = ?) ORDER BY a.id"
        ))
        .bind(language)
        .bind(language)
        .fetch_all(&self.pool)
        .await?;
        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let alias: String = row.try_get("alias")?;
            candidates.push((row_to_ingredient(row)?, alias));
        }
        Ok(rank_by_similarity(candidates, query, min_score, limit))
    }

    async fn aliases_for(&self, ingredient_id: Uuid) -> AppResult<Vec<IngredientAlias>> {
        let rows = sqlx::query(
            "SELECT alias, language, alias_type FROM ingredient_aliases \
             WHERE ingredient_id = ? ORDER BY id",
        )
        .bind(ingredient_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| -> AppResult<IngredientAlias> {
                let language: String = row.try_get("language")?;
                let alias_type: String = row.try_get("alias_type")?;
                Ok(IngredientAlias {
                    ingredient_id,
                    alias: row.try_get("alias")?,
                    language: Some(language).filter(|l| !l.is_empty()),
                    alias_type: AliasType::parse(&alias_type),
                })
            })
            .collect()
    }

    async fn create_ingredient(&self, ingredient: &Ingredient) -> AppResult<Ingredient> {
        let name = canonical_form(&ingredient.canonical_name)?;
        let result = sqlx::query(
            "INSERT INTO ingredients (id, canonical_name, category, created_at) \
             VALUES (?, ?, ?, ?) ON CONFLICT(canonical_name) DO NOTHING",
        )
        .bind(ingredient.id.to_string())
        .bind(&name)
        .bind(ingredient.category.as_str())
        .bind(ingredient.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(ingredient_id = %ingredient.id, canonical_name = %name, "Created ingredient");
        }
        self.find_by_name(&name)
            .await?
            .ok_or_else(|| AppError::database(format!("Ingredient '{name}' vanished after insert")))
    }

    async fn create_alias(&self, alias: &IngredientAlias) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO ingredient_aliases (ingredient_id, alias, language, alias_type) \
             VALUES (?, ?, ?, ?) ON CONFLICT(alias, language) DO NOTHING",
        )
        .bind(alias.ingredient_id.to_string())
        .bind(alias.alias.trim().to_lowercase())
        .bind(alias.language.as_deref().unwrap_or(""))
        .bind(alias.alias_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_nutrition(&self, ingredient_id: Uuid) -> AppResult<Option<NutritionRecord>> {
        let row = sqlx::query(
            "SELECT ingredient_id, calories, protein_g, carbs_g, fat_g, fiber_g, \
             data_source, confidence_score, created_at \
             FROM ingredient_nutrition WHERE ingredient_id = ?",
        )
        .bind(ingredient_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_nutrition).transpose()
    }

    async fn create_nutrition(&self, record: &NutritionRecord) -> AppResult<NutritionRecord> {
        let macros = record.per_100g;
        sqlx::query(
            "INSERT INTO ingredient_nutrition \
             (ingredient_id, calories, protein_g, carbs_g, fat_g, fiber_g, data_source, confidence_score, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(ingredient_id) DO NOTHING",
        )
        .bind(record.ingredient_id.to_string())
        .bind(macros.calories)
        .bind(macros.protein_g)
        .bind(macros.carbs_g)
        .bind(macros.fat_g)
        .bind(macros.fiber_g)
        .bind(record.data_source.as_str())
        .bind(record.confidence_score)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        self.get_nutrition(record.ingredient_id).await?.ok_or_else(|| {
            AppError::database(format!(
                "Nutrition for {} vanished after insert",
                record.ingredient_id
            ))
        })
    }

    async fn find_unit_override(
        &self,
        ingredient_id: Uuid,
        unit: &str,
    ) -> AppResult<Option<UnitConversionOverride>> {
        let row = sqlx::query(
            "SELECT grams_per_unit FROM ingredient_unit_conversions \
             WHERE ingredient_id = ? AND unit = ?",
        )
        .bind(ingredient_id.to_string())
        .bind(unit)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| -> AppResult<UnitConversionOverride> {
            Ok(UnitConversionOverride {
                ingredient_id,
                unit: unit.to_owned(),
                grams_per_unit: row.try_get("grams_per_unit")?,
            })
        })
        .transpose()
    }

    async fn save_unit_override(&self, conversion: &UnitConversionOverride) -> AppResult<()> {
        if conversion.grams_per_unit <= 0.0 || !conversion.grams_per_unit.is_finite() {
            return Err(AppError::invalid_input(format!(
                "grams_per_unit must be positive, got {}",
                conversion.grams_per_unit
            )));
        }
        sqlx::query(
            "INSERT INTO ingredient_unit_conversions (ingredient_id, unit, grams_per_unit) \
             VALUES (?, ?, ?) \
             ON CONFLICT(ingredient_id, unit) DO UPDATE SET grams_per_unit = excluded.grams_per_unit",
        )
        .bind(conversion.ingredient_id.to_string())
        .bind(&conversion.unit)
        .bind(conversion.grams_per_unit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
