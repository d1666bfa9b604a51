// ABOUTME: Integration tests for recipe scaling by servings and by anchor ingredient
// ABOUTME: Covers friendly fractions, unit step-down, baking precision and whole-item handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use larder::culinary::{RecipeScaler, ScaledLine, ScaledRecipe, ScalingPolicy};
use larder::models::{Recipe, RecipeIngredientLine};
use larder::Larder;

fn line(id: &str, name: &str, amount: f64, unit: Option<&str>) -> RecipeIngredientLine {
    RecipeIngredientLine::new(id, name, amount, unit)
}

fn weeknight_stew() -> Recipe {
    let mut salt = line("salt", "salt", 0.0, None);
    salt.amount = None;
    salt.preparation = Some("to taste".into());

    Recipe::new("Weeknight stew", 4.0)
        .with_group(
            None,
            vec![
                line("flour", "flour", 2.0, Some("cup")),
                line("eggs", "eggs", 2.0, None),
                line("stock", "chicken stock", 0.5, Some("cup")),
                line("paste", "tomato paste", 0.5, Some("tbsp")).with_preparation("  "),
                salt,
            ],
        )
        .with_group(
            Some("Garnish"),
            vec![
                line("onion", "onions", 2.0, None).with_preparation("thinly sliced "),
                line("garlic", "garlic", 3.0, Some("cloves")),
            ],
        )
}

fn scaled<'a>(recipe: &'a ScaledRecipe, id: &str) -> &'a ScaledLine {
    recipe.line(id).unwrap_or_else(|| panic!("missing line {id}"))
}

// =============================================================================
// Scaling by servings
// =============================================================================

#[test]
fn test_scale_up_renders_friendly_amounts() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(6.0);

    assert!((result.factor - 1.5).abs() < f64::EPSILON);
    assert!((result.scaled_servings - 6.0).abs() < f64::EPSILON);

    let flour = scaled(&result, "flour");
    assert_eq!(flour.amount, "3");
    assert_eq!(flour.quantity, Some(3.0));
    assert_eq!(flour.unit.as_deref(), Some("cup"));

    assert_eq!(scaled(&result, "stock").amount, "3/4");

    // 3/4 tbsp steps down to 2 1/4 tsp
    let paste = scaled(&result, "paste");
    assert_eq!(paste.amount, "2 1/4");
    assert_eq!(paste.unit.as_deref(), Some("tsp"));
    assert!(paste.preparation.is_none());

    let eggs = scaled(&result, "eggs");
    assert_eq!(eggs.amount, "3");
    assert_eq!(eggs.unit.as_deref(), Some("whole"));
}

#[test]
fn test_lines_without_amount_pass_through() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(8.0);

    let salt = scaled(&result, "salt");
    assert_eq!(salt.amount, "");
    assert!(salt.quantity.is_none());
    assert_eq!(salt.preparation.as_deref(), Some("to taste"));
}

#[test]
fn test_groups_and_positions_are_preserved() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(2.0);

    assert_eq!(result.ingredient_groups.len(), 2);
    assert!(result.ingredient_groups[0].name.is_none());
    assert_eq!(result.ingredient_groups[1].name.as_deref(), Some("Garnish"));
    assert_eq!(
        scaled(&result, "onion").preparation.as_deref(),
        Some("thinly sliced")
    );
    let ids: Vec<&str> = result.lines().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["flour", "eggs", "stock", "paste", "salt", "onion", "garlic"]);
}

#[test]
fn test_zero_servings_in_source_counts_as_one() {
    let mut recipe = weeknight_stew();
    recipe.servings_original = 0.0;
    let result = RecipeScaler::new(&recipe).scale_by_servings(2.0);
    assert!((result.factor - 2.0).abs() < f64::EPSILON);
    assert_eq!(scaled(&result, "flour").amount, "4");
}

#[test]
fn test_non_finite_target_scales_to_nothing() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(f64::NAN);
    assert!(result.factor.abs() < f64::EPSILON);
    let paste = scaled(&result, "paste");
    assert_eq!(paste.amount, "0");
    assert_eq!(paste.unit.as_deref(), Some("tbsp"));
}

#[test]
fn test_negative_target_omits_every_measured_line() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(-4.0);

    assert!(result.scaled_servings.abs() < f64::EPSILON);
    for id in ["flour", "eggs", "stock", "onion"] {
        let line = scaled(&result, id);
        assert_eq!(line.amount, "0", "line {id}");
        assert_eq!(line.note.as_deref(), Some("omit"), "line {id}");
    }
}

// =============================================================================
// Whole items
// =============================================================================

#[test]
fn test_scale_down_omits_or_halves_whole_items() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(1.0);

    // 2 eggs / 4 = 0.5 egg, kept as half an egg
    let eggs = scaled(&result, "eggs");
    assert_eq!(eggs.amount, "0.5");
    assert!(eggs.note.is_none());

    // 3 cloves / 4 = 0.75, rounds to one whole clove
    let garlic = scaled(&result, "garlic");
    assert_eq!(garlic.amount, "1");
    assert_eq!(garlic.quantity, Some(1.0));
    assert_eq!(garlic.unit.as_deref(), Some("whole"));

    let result = RecipeScaler::new(&recipe).scale_by_factor(0.1);
    let onion = scaled(&result, "onion");
    assert_eq!(onion.amount, "0");
    assert_eq!(onion.note.as_deref(), Some("omit"));
}

#[test]
fn test_weighed_whole_items_scale_like_other_lines() {
    let recipe = Recipe::new("Custard", 2.0)
        .with_group(None, vec![line("eggs", "eggs", 100.0, Some("g"))]);
    let result = RecipeScaler::new(&recipe).scale_by_servings(1.0);
    let eggs = scaled(&result, "eggs");
    assert_eq!(eggs.amount, "50");
    assert_eq!(eggs.unit.as_deref(), Some("g"));
}

// =============================================================================
// Baking precision
// =============================================================================

fn sponge() -> Recipe {
    Recipe::new("Sponge", 10.0).with_precision(true).with_group(
        None,
        vec![
            line("flour", "flour", 250.0, Some("g")),
            line("eggs", "eggs", 2.0, None),
            line("powder", "baking powder", 0.5, Some("tsp")),
            line("milk", "milk", 1.0, Some("cup")),
        ],
    )
}

#[test]
fn test_baking_keeps_decimals_and_weighs_small_amounts() {
    let recipe = sponge();
    let result = RecipeScaler::new(&recipe).scale_by_servings(4.0);

    let flour = scaled(&result, "flour");
    assert_eq!(flour.amount, "100.0");
    assert_eq!(flour.unit.as_deref(), Some("g"));

    // 0.2 tsp is below the small-volume threshold: 1 ml taken as 1 g
    let powder = scaled(&result, "powder");
    assert_eq!(powder.amount, "1.0");
    assert_eq!(powder.unit.as_deref(), Some("g"));

    let milk = scaled(&result, "milk");
    assert_eq!(milk.amount, "0.4");
    assert_eq!(milk.unit.as_deref(), Some("cup"));

    // 0.8 egg in baking is weighed
    let eggs = scaled(&result, "eggs");
    assert_eq!(eggs.amount, "40.0");
    assert_eq!(eggs.unit.as_deref(), Some("g"));
    assert_eq!(eggs.note.as_deref(), Some("beaten egg"));
}

#[test]
fn test_baking_tag_enables_precision() {
    let mut recipe = sponge().with_precision(false);
    recipe.recipe_types = vec!["Dessert".into(), " baking ".into()];
    let result = RecipeScaler::new(&recipe).scale_by_servings(4.0);
    assert_eq!(scaled(&result, "flour").amount, "100.0");

    recipe.recipe_types.clear();
    let result = RecipeScaler::new(&recipe).scale_by_servings(4.0);
    assert_eq!(scaled(&result, "flour").amount, "100");
}

// =============================================================================
// Scaling by anchor ingredient
// =============================================================================

#[test]
fn test_anchor_target_is_converted_to_anchor_unit() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe)
        .scale_by_ingredient("flour", 48.0, Some("tbsp"))
        .unwrap();
    assert!((result.factor - 1.5).abs() < 1e-9);
    assert_eq!(scaled(&result, "flour").amount, "3");
    assert!((result.scaled_servings - 6.0).abs() < 1e-9);
}

#[test]
fn test_anchor_by_weight() {
    let recipe = sponge();
    let result = RecipeScaler::new(&recipe)
        .scale_by_ingredient("flour", 1.0, Some("kg"))
        .unwrap();
    assert!((result.factor - 4.0).abs() < 1e-9);
    assert_eq!(scaled(&result, "flour").amount, "1000.0");
}

#[test]
fn test_anchor_without_unit_uses_raw_amount() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe)
        .scale_by_ingredient("eggs", 4.0, None)
        .unwrap();
    assert!((result.factor - 2.0).abs() < f64::EPSILON);
}

#[test]
fn test_unknown_anchor_is_none() {
    let recipe = weeknight_stew();
    assert!(RecipeScaler::new(&recipe)
        .scale_by_ingredient("butter", 100.0, Some("g"))
        .is_none());
}

// =============================================================================
// Policy and facade
// =============================================================================

#[test]
fn test_custom_policy_changes_omit_threshold() {
    let recipe = weeknight_stew();
    let policy = ScalingPolicy {
        whole_item_omit_threshold: 0.6,
        ..ScalingPolicy::default()
    };
    let result = RecipeScaler::new(&recipe)
        .with_policy(policy)
        .scale_by_servings(1.0);
    assert_eq!(scaled(&result, "eggs").note.as_deref(), Some("omit"));
}

#[tokio::test]
async fn test_facade_scaling_matches_scaler() {
    let larder = Larder::new(common::memory_store(), common::fast_config(), None, None);
    let recipe = weeknight_stew();

    let via_facade = larder.scale_recipe_by_servings(&recipe, 6.0);
    let direct = RecipeScaler::new(&recipe).scale_by_servings(6.0);
    assert_eq!(via_facade, direct);

    assert!(larder
        .scale_recipe_by_ingredient(&recipe, "missing", 1.0, None)
        .is_none());
}

#[test]
fn test_scaled_recipe_serializes_for_display() {
    let recipe = weeknight_stew();
    let result = RecipeScaler::new(&recipe).scale_by_servings(6.0);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["ingredient_groups"][0]["items"][0]["amount"], "3");
    assert!(json["ingredient_groups"][0]["items"][4].get("quantity").is_none());
}
