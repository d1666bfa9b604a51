// ABOUTME: Human-friendly rendering of scaled amounts (whole numbers, fractions, mixed numbers)
// ABOUTME: Also parses rendered amounts back to decimals for unit step-down comparisons
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::fmt;

use serde::{Serialize, Serializer};

/// A fraction cooks actually measure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FriendlyFraction {
    /// Decimal value
    pub value: f64,
    /// Display label
    pub label: &'static str,
}

/// Friendly fractions in lookup order
pub const FRIENDLY_FRACTIONS: &[FriendlyFraction] = &[
    FriendlyFraction {
        value: 0.125,
        label: "1/8",
    },
    FriendlyFraction {
        value: 0.25,
        label: "1/4",
    },
    FriendlyFraction {
        value: 1.0 / 3.0,
        label: "1/3",
    },
    FriendlyFraction {
        value: 0.5,
        label: "1/2",
    },
    FriendlyFraction {
        value: 2.0 / 3.0,
        label: "2/3",
    },
    FriendlyFraction {
        value: 0.75,
        label: "3/4",
    },
];

/// Closest friendly fraction strictly within `tolerance` of `value`
#[must_use]
pub fn nearest_fraction(value: f64, tolerance: f64) -> Option<FriendlyFraction> {
    FRIENDLY_FRACTIONS
        .iter()
        .map(|f| (*f, (value - f.value).abs()))
        .filter(|(_, distance)| *distance < tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(f, _)| f)
}

/// Round to a number of decimal places
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// A scaled amount as it will be shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaledAmount {
    /// No amount ("salt to taste")
    Empty,
    /// Integer amount
    Whole(i64),
    /// Proper friendly fraction
    Fraction(FriendlyFraction),
    /// Integer plus friendly fraction ("1 1/2")
    Mixed {
        /// Integer part
        whole: i64,
        /// Fractional part
        fraction: FriendlyFraction,
    },
    /// Rounded decimal
    Decimal(f64),
}

impl ScaledAmount {
    /// Numeric value, `None` when empty
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Whole(n) => Some(*n as f64),
            Self::Fraction(f) => Some(f.value),
            Self::Mixed { whole, fraction } => Some(*whole as f64 + fraction.value),
            Self::Decimal(v) => Some(*v),
        }
    }

    /// Amount for a count of whole items (multiples of a half)
    #[must_use]
    pub fn from_count(count: f64) -> Self {
        if count.fract().abs() < f64::EPSILON {
            Self::Whole(count as i64)
        } else {
            Self::Decimal(count)
        }
    }
}

impl fmt::Display for ScaledAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Whole(n) => write!(f, "{n}"),
            Self::Fraction(frac) => f.write_str(frac.label),
            Self::Mixed { whole, fraction } => write!(f, "{whole} {}", fraction.label),
            // Debug keeps a trailing ".0" on integral decimals
            Self::Decimal(v) => write!(f, "{v:?}"),
        }
    }
}

impl Serialize for ScaledAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse "2", "1.5", "3/4" or "1 1/2" into a decimal
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for part in text.split_whitespace() {
        total += match part.split_once('/') {
            Some((num, den)) => {
                let (num, den): (f64, f64) = (num.parse().ok()?, den.parse().ok()?);
                if den == 0.0 {
                    return None;
                }
                num / den
            }
            None => part.parse::<f64>().ok()?,
        };
    }
    Some(total)
}
