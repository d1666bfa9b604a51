// ABOUTME: Unit conversion graph for recipe quantities with multi-hop resolution
// ABOUTME: Canonicalizes unit symbols and converts amounts via BFS over weighted edges
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

//! Units are nodes, known factors are edges. An edge `a -> b` with factor `f`
//! means `1 a == f b`; walking it backwards multiplies by `1 / f`. Resolution is
//! a breadth-first search, so a direct factor always wins over a reverse one
//! and over longer paths.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::LazyLock;

use larder_core::errors::{AppError, AppResult};

/// Volume conversion factors
const ML_PER_CUP: f64 = 240.0;
const ML_PER_TBSP: f64 = 15.0;
const ML_PER_TSP: f64 = 5.0;
const ML_PER_FL_OZ: f64 = 29.5735;

/// Weight conversion factors
const GRAMS_PER_OZ: f64 = 28.3495;
const GRAMS_PER_LB: f64 = 453.592;
const GRAMS_PER_KG: f64 = 1000.0;

/// Base edges of the standard graph
const STANDARD_EDGES: &[(&str, &str, f64)] = &[
    // === Volume ===
    ("cup", "tbsp", 16.0),
    ("cup", "tsp", 48.0),
    ("cup", "ml", ML_PER_CUP),
    ("tbsp", "tsp", 3.0),
    ("tbsp", "ml", ML_PER_TBSP),
    ("tsp", "ml", ML_PER_TSP),
    ("l", "ml", 1000.0),
    ("dl", "ml", 100.0),
    ("cl", "ml", 10.0),
    ("fl oz", "ml", ML_PER_FL_OZ),
    // === Weight ===
    ("kg", "g", GRAMS_PER_KG),
    ("lb", "oz", 16.0),
    ("lb", "g", GRAMS_PER_LB),
    ("oz", "g", GRAMS_PER_OZ),
    ("g", "mg", 1000.0),
];

/// Surface spellings mapped to canonical symbols
static UNIT_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: &[(&str, &[&str])] = &[
        ("cup", &["cup", "cups", "c"]),
        ("tbsp", &["tbsp", "tbs", "tbl", "tablespoon", "tablespoons"]),
        ("tsp", &["tsp", "teaspoon", "teaspoons"]),
        ("ml", &["ml", "milliliter", "milliliters", "millilitre", "millilitres"]),
        ("l", &["l", "liter", "liters", "litre", "litres"]),
        ("dl", &["dl", "deciliter", "deciliters", "decilitre", "decilitres"]),
        ("cl", &["cl", "centiliter", "centiliters", "centilitre", "centilitres"]),
        ("fl oz", &["fl oz", "floz", "fl. oz", "fluid ounce", "fluid ounces"]),
        ("g", &["g", "gr", "gram", "grams", "gramme", "grammes"]),
        ("kg", &["kg", "kgs", "kilogram", "kilograms"]),
        ("mg", &["mg", "milligram", "milligrams"]),
        ("oz", &["oz", "ounce", "ounces"]),
        ("lb", &["lb", "lbs", "pound", "pounds"]),
        ("whole", &["whole"]),
        ("piece", &["piece", "pieces", "pc", "pcs"]),
        ("item", &["item", "items"]),
        ("clove", &["clove", "cloves"]),
        ("slice", &["slice", "slices"]),
        ("stalk", &["stalk", "stalks"]),
        ("sprig", &["sprig", "sprigs"]),
        ("bunch", &["bunch", "bunches"]),
        ("head", &["head", "heads"]),
        ("leaf", &["leaf", "leaves"]),
        ("can", &["can", "cans"]),
        ("packet", &["packet", "packets"]),
        ("package", &["package", "packages", "pkg"]),
    ];
    groups
        .iter()
        .flat_map(|(canonical, spellings)| spellings.iter().map(move |s| (*s, *canonical)))
        .collect()
});

const VOLUME_UNITS: &[&str] = &["cup", "tbsp", "tsp", "ml", "l", "dl", "cl", "fl oz"];
const WEIGHT_UNITS: &[&str] = &["g", "kg", "mg", "oz", "lb"];
const COUNT_UNITS: &[&str] = &[
    "whole", "piece", "item", "clove", "slice", "stalk", "sprig", "bunch", "head", "leaf", "can",
    "packet", "package",
];
const SMALL_VOLUME_UNITS: &[&str] = &["cup", "tbsp", "tsp"];

/// Physical dimension of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Measured by volume (cup, ml, ...)
    Volume,
    /// Measured by mass (g, lb, ...)
    Weight,
    /// Discrete items (whole, piece, clove, ...)
    Count,
    /// Not a recognized unit
    Unknown,
}

/// Canonical symbol for a unit spelling.
///
/// Unknown spellings come back trimmed and lowercased so they still compare
/// equal to themselves.
#[must_use]
pub fn canonical_unit(symbol: &str) -> String {
    let cleaned = symbol
        .trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    UNIT_ALIASES
        .get(cleaned.as_str())
        .map_or(cleaned, |canonical| (*canonical).to_owned())
}

/// Classify a unit spelling
#[must_use]
pub fn unit_kind(symbol: &str) -> UnitKind {
    let unit = canonical_unit(symbol);
    if VOLUME_UNITS.contains(&unit.as_str()) {
        UnitKind::Volume
    } else if WEIGHT_UNITS.contains(&unit.as_str()) {
        UnitKind::Weight
    } else if COUNT_UNITS.contains(&unit.as_str()) {
        UnitKind::Count
    } else {
        UnitKind::Unknown
    }
}

/// Cup, tablespoon, or teaspoon
#[must_use]
pub fn is_small_volume(symbol: &str) -> bool {
    SMALL_VOLUME_UNITS.contains(&canonical_unit(symbol).as_str())
}

static STANDARD_GRAPH: LazyLock<UnitGraph> = LazyLock::new(|| {
    let mut graph = UnitGraph::new();
    for (from, to, factor) in STANDARD_EDGES {
        graph.insert_edge(from, to, *factor);
    }
    graph
});

/// Weighted, bidirectional unit graph
#[derive(Debug, Clone, Default)]
pub struct UnitGraph {
    adjacency: HashMap<String, Vec<(String, f64)>>,
}

impl UnitGraph {
    /// Empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared graph with the built-in kitchen units
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_GRAPH
    }

    /// Copy of the standard graph that can be extended
    #[must_use]
    pub fn standard_owned() -> Self {
        STANDARD_GRAPH.clone()
    }

    /// Add an edge `1 from == factor to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is not a finite positive number or the
    /// two units are the same.
    pub fn add_edge(&mut self, from: &str, to: &str, factor: f64) -> AppResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(AppError::invalid_input(format!(
                "Conversion factor {from} -> {to} must be positive, got {factor}"
            )));
        }
        let (from, to) = (canonical_unit(from), canonical_unit(to));
        if from == to {
            return Err(AppError::invalid_input(format!(
                "Cannot add a self-conversion for unit '{from}'"
            )));
        }
        self.insert_edge(&from, &to, factor);
        Ok(())
    }

    fn insert_edge(&mut self, from: &str, to: &str, factor: f64) {
        self.adjacency
            .entry(from.to_owned())
            .or_default()
            .push((to.to_owned(), factor));
        self.adjacency
            .entry(to.to_owned())
            .or_default()
            .push((from.to_owned(), 1.0 / factor));
    }

    /// Whether the unit appears in the graph
    #[must_use]
    pub fn contains(&self, unit: &str) -> bool {
        self.adjacency.contains_key(&canonical_unit(unit))
    }

    /// Multiplier turning one `from` into `to`, if a path exists
    #[must_use]
    pub fn factor(&self, from: &str, to: &str) -> Option<f64> {
        let (from, to) = (canonical_unit(from), canonical_unit(to));
        if from == to {
            return Some(1.0);
        }
        if !self.adjacency.contains_key(&from) || !self.adjacency.contains_key(&to) {
            return None;
        }

        let mut visited: HashSet<&str> = HashSet::from([from.as_str()]);
        let mut queue: VecDeque<(&str, f64)> = VecDeque::from([(from.as_str(), 1.0)]);

        while let Some((unit, acc)) = queue.pop_front() {
            for (next, factor) in self.adjacency.get(unit).into_iter().flatten() {
                if next == &to {
                    return Some(acc * factor);
                }
                if visited.insert(next.as_str()) {
                    queue.push_back((next.as_str(), acc * factor));
                }
            }
        }
        None
    }

    /// Convert when a path exists
    #[must_use]
    pub fn try_convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        self.factor(from, to).map(|factor| amount * factor)
    }

    /// Convert `amount` from one unit to another.
    ///
    /// Returns `amount` unchanged when no path connects the units; callers that
    /// need to know the difference use [`Self::try_convert`].
    #[must_use]
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> f64 {
        self.try_convert(amount, from, to).unwrap_or(amount)
    }

    /// Convert to grams (unchanged when the unit has no weight path)
    #[must_use]
    pub fn to_grams(&self, amount: f64, unit: &str) -> f64 {
        self.convert(amount, unit, "g")
    }
}
