// ABOUTME: Gram estimates for ingredient lines without an ingredient-specific override
// ABOUTME: Density table for volume units and average item weights for count units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! Densities are approximate averages keyed on substrings of the ingredient
//! name; the first matching row wins, so more specific liquids come first.

use crate::text::contains_term;
use crate::units::{canonical_unit, unit_kind, UnitGraph, UnitKind};

/// Grams per milliliter by name substring
const DENSITIES: &[(&[&str], f64)] = &[
    (&["water", "stock", "broth"], 1.0),
    (&["milk", "cream"], 1.03),
    (&["oil", "butter"], 0.92),
    (&["honey", "syrup"], 1.4),
    (&["flour"], 0.5),
    (&["sugar"], 0.85),
    (&["rice"], 0.75),
];

const DEFAULT_DENSITY: f64 = 1.0;

/// Average grams per item by name term
const ITEM_WEIGHTS: &[(&str, f64)] = &[
    ("chicken breast", 150.0),
    ("egg", 50.0),
    ("onion", 150.0),
    ("tomato", 100.0),
    ("potato", 150.0),
    ("carrot", 60.0),
    ("apple", 150.0),
    ("banana", 120.0),
    ("garlic", 5.0),
    ("clove", 5.0),
];

const DEFAULT_ITEM_WEIGHT: f64 = 100.0;

/// Density (g/ml) guessed from the ingredient name
#[must_use]
pub fn density_g_per_ml(name: &str) -> f64 {
    let name = name.to_lowercase();
    DENSITIES
        .iter()
        .find(|(keys, _)| keys.iter().any(|key| name.contains(key)))
        .map_or(DEFAULT_DENSITY, |(_, density)| *density)
}

/// Average weight (g) of one item guessed from the ingredient name
#[must_use]
pub fn grams_per_item(name: &str) -> f64 {
    ITEM_WEIGHTS
        .iter()
        .find(|(term, _)| contains_term(name, term))
        .map_or(DEFAULT_ITEM_WEIGHT, |(_, grams)| *grams)
}

/// Estimate the mass of an ingredient line.
///
/// - weight units convert exactly
/// - volume units go through milliliters and the density table
/// - count units, and lines with no unit, use the per-item weight
/// - anything unrecognized is taken to already be grams
///
/// Missing, zero, or negative amounts weigh nothing.
#[must_use]
pub fn estimate_grams(graph: &UnitGraph, name: &str, amount: Option<f64>, unit: Option<&str>) -> f64 {
    let Some(amount) = amount.filter(|a| a.is_finite() && *a > 0.0) else {
        return 0.0;
    };
    let Some(unit) = unit.map(canonical_unit).filter(|u| !u.is_empty()) else {
        return amount * grams_per_item(name);
    };

    match unit_kind(&unit) {
        UnitKind::Weight => graph.try_convert(amount, &unit, "g").unwrap_or(amount),
        UnitKind::Volume => graph
            .try_convert(amount, &unit, "ml")
            .map_or(amount, |ml| ml * density_g_per_ml(name)),
        UnitKind::Count => amount * grams_per_item(name),
        UnitKind::Unknown => amount,
    }
}
