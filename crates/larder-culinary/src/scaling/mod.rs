// ABOUTME: Recipe scaling by target servings or by a single anchor ingredient
// ABOUTME: Applies cooking (friendly fraction) or baking (gram precision) rounding per line
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! # Recipe Scaling
//!
//! Every line is multiplied by one factor, then presented according to the
//! recipe's precision flag:
//!
//! - **cooking**: whole numbers, friendly fractions ("1/3"), mixed numbers
//!   ("1 1/2"), then a unit step-down for tiny tablespoon and cup amounts
//! - **baking**: two decimals, with tiny cup/tbsp/tsp amounts re-expressed in
//!   grams (1 ml taken as 1 g)
//!
//! Eggs, onions, and garlic cloves bypass both and go through
//! [`WholeItemPolicy`].

/// Friendly fraction rendering and parsing
pub mod rounding;

pub use rounding::{nearest_fraction, parse_amount, round_to, FriendlyFraction, ScaledAmount};

use larder_core::constants::scaling::{
    FRACTION_TOLERANCE, SMALL_VOLUME_THRESHOLD, WHOLE_ITEM_OMIT_THRESHOLD, WHOLE_ITEM_STEP,
    WHOLE_NUMBER_TOLERANCE,
};
use larder_core::models::{Recipe, RecipeIngredientLine};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::units::{canonical_unit, is_small_volume, unit_kind, UnitGraph, UnitKind};
use crate::whole_items::{WholeItemOutcome, WholeItemPolicy};

/// Unit written on every rounded whole-item line
const WHOLE_UNIT: &str = "whole";
/// Note attached to omitted lines
const OMIT_NOTE: &str = "omit";
/// Unit used when baking amounts are re-expressed by weight
const GRAM_UNIT: &str = "g";

/// Tunable rounding thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Snap to an integer when this close to it
    pub whole_number_tolerance: f64,
    /// Snap to a friendly fraction when this close to it
    pub fraction_tolerance: f64,
    /// Baking amounts of cup/tbsp/tsp below this switch to grams
    pub small_volume_threshold: f64,
    /// Whole items below this count are omitted outside baking
    pub whole_item_omit_threshold: f64,
    /// Whole items round to multiples of this
    pub whole_item_step: f64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            whole_number_tolerance: WHOLE_NUMBER_TOLERANCE,
            fraction_tolerance: FRACTION_TOLERANCE,
            small_volume_threshold: SMALL_VOLUME_THRESHOLD,
            whole_item_omit_threshold: WHOLE_ITEM_OMIT_THRESHOLD,
            whole_item_step: WHOLE_ITEM_STEP,
        }
    }
}

/// One scaled ingredient line, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledLine {
    /// Id of the source line
    pub id: String,
    /// Ingredient name
    pub name: String,
    /// Rendered amount ("1 1/2", "40.0", "" when absent)
    pub amount: String,
    /// Numeric value of `amount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    /// Unit after any step-down or gram conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Preparation notes, omitted when blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    /// Scaling annotation ("omit", "beaten egg")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Whether the source line was optional
    pub optional: bool,
    /// Position within the group
    pub position: u32,
}

/// Scaled ingredient group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledGroup {
    /// Group heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Scaled lines
    pub items: Vec<ScaledLine>,
}

/// Result of scaling a recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledRecipe {
    /// Factor every amount was multiplied by
    pub factor: f64,
    /// Servings the scaled amounts produce
    pub scaled_servings: f64,
    /// Groups in source order
    pub ingredient_groups: Vec<ScaledGroup>,
}

impl ScaledRecipe {
    /// Every scaled line across all groups
    pub fn lines(&self) -> impl Iterator<Item = &ScaledLine> {
        self.ingredient_groups.iter().flat_map(|g| g.items.iter())
    }

    /// Scaled line by source id
    #[must_use]
    pub fn line(&self, id: &str) -> Option<&ScaledLine> {
        self.lines().find(|line| line.id == id)
    }
}

/// Scales one recipe
#[derive(Debug, Clone)]
pub struct RecipeScaler<'a> {
    recipe: &'a Recipe,
    graph: &'a UnitGraph,
    policy: ScalingPolicy,
    whole_items: WholeItemPolicy,
}

impl<'a> RecipeScaler<'a> {
    /// Scaler with the default policy and the standard unit graph
    #[must_use]
    pub fn new(recipe: &'a Recipe) -> Self {
        Self {
            recipe,
            graph: UnitGraph::standard(),
            policy: ScalingPolicy::default(),
            whole_items: WholeItemPolicy::default(),
        }
    }

    /// Use custom rounding thresholds
    #[must_use]
    pub fn with_policy(mut self, policy: ScalingPolicy) -> Self {
        self.whole_items =
            WholeItemPolicy::new(policy.whole_item_omit_threshold, policy.whole_item_step);
        self.policy = policy;
        self
    }

    /// Use a custom unit graph
    #[must_use]
    pub const fn with_graph(mut self, graph: &'a UnitGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Scale so the recipe yields `target_servings`
    #[must_use]
    pub fn scale_by_servings(&self, target_servings: f64) -> ScaledRecipe {
        let original = positive_or_one(Some(self.recipe.servings_original));
        self.scale_by_factor(target_servings / original)
    }

    /// Scale so the line `anchor_id` becomes `target_amount` of `target_unit`.
    ///
    /// The target is converted into the anchor's own unit first. Returns `None`
    /// when no line has that id.
    #[must_use]
    pub fn scale_by_ingredient(
        &self,
        anchor_id: &str,
        target_amount: f64,
        target_unit: Option<&str>,
    ) -> Option<ScaledRecipe> {
        let anchor = self.recipe.find_line(anchor_id)?;
        let converted = match (target_unit, anchor.unit.as_deref()) {
            (Some(from), Some(to)) => self.graph.convert(target_amount, from, to),
            _ => target_amount,
        };
        let factor = converted / positive_or_one(anchor.amount);
        debug!(anchor_id, converted, factor, "Scaling recipe by anchor ingredient");
        Some(self.scale_by_factor(factor))
    }

    /// Multiply every line by `factor`
    #[must_use]
    pub fn scale_by_factor(&self, factor: f64) -> ScaledRecipe {
        let factor = if factor.is_finite() { factor } else { 0.0 };
        let baking = self.recipe.is_precision_sensitive();
        let ingredient_groups = self
            .recipe
            .ingredient_groups
            .iter()
            .map(|group| ScaledGroup {
                name: group.name.clone(),
                items: group
                    .items
                    .iter()
                    .map(|line| self.scale_line(line, factor, baking))
                    .collect(),
            })
            .collect();

        ScaledRecipe {
            factor,
            scaled_servings: round_to(self.recipe.servings_original * factor, 1).max(0.0),
            ingredient_groups,
        }
    }

    fn scale_line(&self, line: &RecipeIngredientLine, factor: f64, baking: bool) -> ScaledLine {
        let mut scaled = ScaledLine {
            id: line.id.clone(),
            name: line.name.clone(),
            amount: String::new(),
            quantity: None,
            unit: line.unit.clone(),
            preparation: line
                .preparation
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned),
            note: None,
            optional: line.optional,
            position: line.position,
        };
        let Some(original) = line.amount else {
            return scaled;
        };
        let raw = original * factor;

        let (amount, unit, note) = if let Some(outcome) = self.whole_item_outcome(line, raw, baking) {
            match outcome {
                WholeItemOutcome::Grams { grams, note } => (
                    ScaledAmount::Decimal(grams),
                    Some(GRAM_UNIT.to_owned()),
                    note.map(str::to_owned),
                ),
                WholeItemOutcome::Omit => omit_sentinel(),
                WholeItemOutcome::Whole(count) => (
                    ScaledAmount::from_count(count),
                    Some(WHOLE_UNIT.to_owned()),
                    None,
                ),
            }
        } else if raw < 0.0 {
            omit_sentinel()
        } else if baking {
            let (amount, unit) = self.round_precise(raw, line.unit.as_deref());
            (amount, unit, None)
        } else {
            let (amount, unit) = self.round_standard(raw, line.unit.as_deref());
            (amount, unit, None)
        };

        scaled.amount = amount.to_string();
        scaled.quantity = amount.value();
        scaled.unit = unit;
        scaled.note = note;
        scaled
    }

    /// Whole-item handling applies to count lines only; "100 g eggs" is weighed
    fn whole_item_outcome(
        &self,
        line: &RecipeIngredientLine,
        raw: f64,
        baking: bool,
    ) -> Option<WholeItemOutcome> {
        let subject = match line.unit.as_deref() {
            None => line.name.clone(),
            Some(unit) if unit_kind(unit) == UnitKind::Count => format!("{} {unit}", line.name),
            Some(_) => return None,
        };
        self.whole_items.apply(&subject, raw, baking)
    }

    /// Baking: two decimals, or grams for tiny small-volume amounts
    fn round_precise(&self, raw: f64, unit: Option<&str>) -> (ScaledAmount, Option<String>) {
        if let Some(unit) = unit {
            if is_small_volume(unit) && raw > 0.0 && raw < self.policy.small_volume_threshold {
                if let Some(ml) = self.graph.try_convert(raw, unit, "ml") {
                    return (
                        ScaledAmount::Decimal(round_to(ml, 1)),
                        Some(GRAM_UNIT.to_owned()),
                    );
                }
            }
        }
        (ScaledAmount::Decimal(round_to(raw, 2)), unit.map(str::to_owned))
    }

    /// Cooking: friendly rendering, then step tiny tbsp/cup amounts down a unit
    fn round_standard(&self, raw: f64, unit: Option<&str>) -> (ScaledAmount, Option<String>) {
        let mut raw = raw;
        let mut unit = unit.map(str::to_owned);
        let mut amount = self.friendly(raw);

        while let Some(current) = unit.as_deref().map(canonical_unit) {
            let shown = parse_amount(&amount.to_string()).unwrap_or(raw);
            let smaller = match current.as_str() {
                "tbsp" if shown < 1.0 => "tsp",
                "cup" if shown < 0.25 => "tbsp",
                _ => break,
            };
            if raw <= 0.0 {
                break;
            }
            raw = self.graph.convert(raw, &current, smaller);
            unit = Some(smaller.to_owned());
            amount = self.friendly(raw);
        }
        (amount, unit)
    }

    fn friendly(&self, value: f64) -> ScaledAmount {
        let nearest = value.round();
        if (value - nearest).abs() < self.policy.whole_number_tolerance {
            return ScaledAmount::Whole(nearest as i64);
        }
        if let Some(fraction) = nearest_fraction(value, self.policy.fraction_tolerance) {
            return ScaledAmount::Fraction(fraction);
        }
        if value > 1.0 {
            let whole = value.floor();
            if let Some(fraction) = nearest_fraction(value - whole, self.policy.fraction_tolerance) {
                return ScaledAmount::Mixed {
                    whole: whole as i64,
                    fraction,
                };
            }
        }
        ScaledAmount::Decimal(round_to(value, 1))
    }
}

fn omit_sentinel() -> (ScaledAmount, Option<String>, Option<String>) {
    (
        ScaledAmount::Whole(0),
        Some(WHOLE_UNIT.to_owned()),
        Some(OMIT_NOTE.to_owned()),
    )
}

fn positive_or_one(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(1.0)
}
