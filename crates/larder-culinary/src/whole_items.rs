// ABOUTME: Policy for discrete-count ingredients scaled to fractional quantities
// ABOUTME: Converts to grams in baking, omits tiny amounts, otherwise rounds to half items
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use larder_core::constants::scaling::{WHOLE_ITEM_OMIT_THRESHOLD, WHOLE_ITEM_STEP};

use crate::text::contains_term;

/// A count-based ingredient
#[derive(Debug, Clone, PartialEq)]
pub struct WholeItem {
    /// Name term matched against ingredient names
    pub term: &'static str,
    /// Average weight of one item
    pub grams_each: f64,
    /// Annotation used when the item is weighed instead of counted
    pub weighed_note: Option<&'static str>,
}

const STANDARD_ITEMS: &[WholeItem] = &[
    WholeItem {
        term: "egg",
        grams_each: 50.0,
        weighed_note: Some("beaten egg"),
    },
    WholeItem {
        term: "onion",
        grams_each: 150.0,
        weighed_note: None,
    },
    WholeItem {
        term: "clove",
        grams_each: 5.0,
        weighed_note: None,
    },
];

/// What the policy decided for one line
#[derive(Debug, Clone, PartialEq)]
pub enum WholeItemOutcome {
    /// Express the line in grams instead of items
    Grams {
        /// Weight, rounded to one decimal
        grams: f64,
        /// Annotation for the reader
        note: Option<&'static str>,
    },
    /// Too little to be worth including
    Omit,
    /// Count of items, a multiple of the rounding step
    Whole(f64),
}

/// Special handling for eggs, onions, garlic cloves and the like
#[derive(Debug, Clone)]
pub struct WholeItemPolicy {
    items: Vec<WholeItem>,
    omit_threshold: f64,
    step: f64,
}

impl Default for WholeItemPolicy {
    fn default() -> Self {
        Self::new(WHOLE_ITEM_OMIT_THRESHOLD, WHOLE_ITEM_STEP)
    }
}

impl WholeItemPolicy {
    /// Standard item list with the given thresholds
    #[must_use]
    pub fn new(omit_threshold: f64, step: f64) -> Self {
        Self {
            items: STANDARD_ITEMS.to_vec(),
            omit_threshold,
            step: if step > 0.0 { step } else { WHOLE_ITEM_STEP },
        }
    }

    /// Register another count-based ingredient
    #[must_use]
    pub fn with_item(mut self, item: WholeItem) -> Self {
        self.items.push(item);
        self
    }

    /// The whole item `name` refers to, if any
    #[must_use]
    pub fn matching(&self, name: &str) -> Option<&WholeItem> {
        self.items.iter().find(|item| contains_term(name, item.term))
    }

    /// Decide how a scaled whole-item amount should be presented.
    ///
    /// Returns `None` when `name` is not a whole item.
    #[must_use]
    pub fn apply(&self, name: &str, scaled: f64, baking: bool) -> Option<WholeItemOutcome> {
        let item = self.matching(name)?;
        if scaled < 0.0 {
            return Some(WholeItemOutcome::Omit);
        }
        let outcome = if baking && scaled < 1.0 {
            WholeItemOutcome::Grams {
                grams: (scaled * item.grams_each * 10.0).round() / 10.0,
                note: item.weighed_note,
            }
        } else if !baking && scaled < self.omit_threshold {
            WholeItemOutcome::Omit
        } else {
            WholeItemOutcome::Whole((scaled / self.step).round() * self.step)
        };
        Some(outcome)
    }
}
