// ABOUTME: Per-100g macro values and immutable nutrition records with provenance
// ABOUTME: Macros arithmetic (scaling by grams, summing, per-serving rounding) lives here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::ops::{Add, AddAssign};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::nutrition::{
    FALLBACK_CALORIES, FALLBACK_CARBS_G, FALLBACK_FAT_G, FALLBACK_FIBER_G, FALLBACK_PROTEIN_G,
    REFERENCE_GRAMS,
};

/// Where a nutrition record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Curated data already present in the store
    Stored,
    /// External nutrition API
    ExternalApi,
    /// Generative model estimate (or its fallback defaults)
    GenerativeEstimate,
}

impl DataSource {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::ExternalApi => "external_api",
            Self::GenerativeEstimate => "generative_estimate",
        }
    }

    /// Parse from database string representation
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "external_api" => Self::ExternalApi,
            "generative_estimate" => Self::GenerativeEstimate,
            _ => Self::Stored,
        }
    }
}

/// Macro-nutrient values
///
/// Usually expressed per 100 g; recipe totals reuse the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
    /// Fat in grams
    pub fat_g: f64,
    /// Dietary fiber in grams
    pub fiber_g: f64,
}

impl Macros {
    /// Construct from explicit values
    #[must_use]
    pub const fn new(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64, fiber_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            carbs_g,
            fat_g,
            fiber_g,
        }
    }

    /// All-zero macros
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Defaults used when every lookup tier came back empty
    #[must_use]
    pub const fn fallback() -> Self {
        Self::new(
            FALLBACK_CALORIES,
            FALLBACK_PROTEIN_G,
            FALLBACK_CARBS_G,
            FALLBACK_FAT_G,
            FALLBACK_FIBER_G,
        )
    }

    /// Apply `f` to every field
    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(
            f(self.calories),
            f(self.protein_g),
            f(self.carbs_g),
            f(self.fat_g),
            f(self.fiber_g),
        )
    }

    /// Multiply every field by `factor`
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Macros contained in `grams` of an ingredient described per 100 g
    #[must_use]
    pub fn for_grams(self, grams: f64) -> Self {
        self.scale(grams / REFERENCE_GRAMS)
    }

    /// Round every field to `places` decimals
    #[must_use]
    pub fn rounded(self, places: i32) -> Self {
        self.map(|v| round_to(v, places))
    }

    /// Divide a recipe total across servings.
    ///
    /// Servings below one are treated as one. Calories round to whole numbers,
    /// everything else to one decimal.
    #[must_use]
    pub fn per_serving(self, servings: f64) -> Self {
        let divisor = servings.max(1.0);
        let each = self.scale(1.0 / divisor);
        Self {
            calories: each.calories.round(),
            ..each.rounded(1)
        }
    }

    /// True when every field is finite and non-negative
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        [
            self.calories,
            self.protein_g,
            self.carbs_g,
            self.fat_g,
            self.fiber_g,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

impl Add for Macros {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.calories + rhs.calories,
            self.protein_g + rhs.protein_g,
            self.carbs_g + rhs.carbs_g,
            self.fat_g + rhs.fat_g,
            self.fiber_g + rhs.fiber_g,
        )
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

/// Immutable per-100g nutrition record, one per ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    /// Ingredient this record describes
    pub ingredient_id: Uuid,
    /// Per-100g values
    #[serde(flatten)]
    pub per_100g: Macros,
    /// Provenance
    pub data_source: DataSource,
    /// Confidence in `[0, 1]`
    pub confidence_score: f64,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl NutritionRecord {
    /// Create a record, clamping confidence into `[0, 1]`
    #[must_use]
    pub fn new(ingredient_id: Uuid, per_100g: Macros, data_source: DataSource, confidence: f64) -> Self {
        Self {
            ingredient_id,
            per_100g,
            data_source,
            confidence_score: confidence.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_serving_never_divides_by_zero() {
        let total = Macros::new(400.0, 20.0, 30.0, 10.0, 4.0);
        assert_eq!(total.per_serving(0.0), total.rounded(1));
        let half = total.per_serving(2.0);
        assert!((half.calories - 200.0).abs() < f64::EPSILON);
        assert!((half.protein_g - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_serving_rounds_calories_whole() {
        let total = Macros::new(100.0, 10.0, 10.0, 10.0, 10.0);
        let third = total.per_serving(3.0);
        assert!((third.calories - 33.0).abs() < f64::EPSILON);
        assert!((third.protein_g - 3.3).abs() < 1e-9);
    }

    #[test]
    fn test_for_grams_scales_from_reference() {
        let per_100g = Macros::new(165.0, 31.0, 0.0, 3.6, 0.0);
        let portion = per_100g.for_grams(150.0);
        assert!((portion.calories - 247.5).abs() < 1e-9);
    }

    #[test]
    fn test_data_source_roundtrip() {
        for source in [
            DataSource::Stored,
            DataSource::ExternalApi,
            DataSource::GenerativeEstimate,
        ] {
            assert_eq!(DataSource::parse(source.as_str()), source);
        }
    }
}
