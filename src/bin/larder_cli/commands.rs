// ABOUTME: Command implementations for larder-cli
// ABOUTME: Loads recipe files, calls the Larder facade and prints JSON results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::path::Path;

use anyhow::{bail, Context, Result};
use larder::culinary::UnitGraph;
use larder::models::Recipe;
use larder::Larder;
use serde::Serialize;
use serde_json::json;

/// How `scale` picks its factor
pub enum ScaleTarget {
    /// Scale to a serving count
    Servings(f64),
    /// Scale so one line reaches a target amount
    Anchor {
        line_id: String,
        amount: f64,
        unit: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn load_recipe(path: &Path) -> Result<Recipe> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading recipe file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing recipe file {}", path.display()))
}

pub fn convert(amount: f64, from: &str, to: &str) -> Result<()> {
    let Some(converted) = UnitGraph::standard().try_convert(amount, from, to) else {
        bail!("no conversion from '{from}' to '{to}'");
    };
    print_json(&json!({
        "amount": amount,
        "from": from,
        "to": to,
        "result": converted,
    }))
}

pub async fn search(larder: &Larder, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(larder.config().matching.search_limit);
    let found = larder.search_ingredients(query, limit).await?;
    print_json(&found)
}

pub async fn resolve(larder: &Larder, name: &str) -> Result<()> {
    match larder.resolve_ingredient(name).await? {
        Some(ingredient) => print_json(&ingredient),
        None => print_json(&larder.find_or_suggest(name).await?),
    }
}

pub async fn lookup(larder: &Larder, name: &str, language: Option<&str>) -> Result<()> {
    let lookup = larder.lookup_nutrition(name, language).await;
    print_json(&lookup)
}

pub async fn scale(larder: &Larder, path: &Path, target: ScaleTarget) -> Result<()> {
    let recipe = load_recipe(path).await?;
    let scaled = match target {
        ScaleTarget::Servings(servings) => larder.scale_recipe_by_servings(&recipe, servings),
        ScaleTarget::Anchor {
            line_id,
            amount,
            unit,
        } => larder
            .scale_recipe_by_ingredient(&recipe, &line_id, amount, unit.as_deref())
            .with_context(|| format!("recipe has no ingredient line '{line_id}'"))?,
    };
    print_json(&scaled)
}

pub async fn nutrition(larder: &Larder, path: &Path) -> Result<()> {
    let recipe = load_recipe(path).await?;
    let totals = larder.calculate_recipe_nutrition(&recipe).await;
    print_json(&totals)
}

pub async fn unit_override(larder: &Larder, name: &str, unit: &str, grams: f64) -> Result<()> {
    let Some(ingredient) = larder.resolve_ingredient(name).await? else {
        bail!("unknown ingredient '{name}'");
    };
    let conversion = larder.add_unit_override(ingredient.id, unit, grams).await?;
    print_json(&conversion)
}
