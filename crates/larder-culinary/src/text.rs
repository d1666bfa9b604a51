// ABOUTME: Ingredient name normalization, singularization, and coarse category guessing
// ABOUTME: Shared by the resolver, the nutrition tiers, and the whole-item policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::sync::LazyLock;

use larder_core::models::IngredientCategory;
use regex::Regex;

/// Anything that is not a letter, digit, whitespace, or hyphen
static PUNCTUATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s-]").ok());

/// Words that look plural but are not
const UNCOUNTABLE: &[&str] = &[
    "asparagus",
    "couscous",
    "citrus",
    "hummus",
    "molasses",
    "swiss",
    "series",
    "species",
    "grits",
    "oats",
    "bitters",
];

/// Irregular plurals
const IRREGULAR: &[(&str, &str)] = &[
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("halves", "half"),
    ("knives", "knife"),
    ("calves", "calf"),
    ("cookies", "cookie"),
    ("brownies", "brownie"),
    ("pies", "pie"),
    ("veggies", "veggie"),
    ("smoothies", "smoothie"),
    ("calories", "calorie"),
    ("geese", "goose"),
    ("children", "child"),
];

/// Search-query normalization: trim, lowercase, collapse whitespace
#[must_use]
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ingredient-name normalization used for canonical names and nutrition
/// matching: query normalization plus punctuation removal and singularization
/// of the final word ("Roma Tomatoes," -> "roma tomato").
#[must_use]
pub fn normalize_ingredient_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = PUNCTUATION
        .as_ref()
        .map_or_else(|| lowered.clone(), |re| re.replace_all(&lowered, "").into_owned());
    let mut words: Vec<String> = stripped.split_whitespace().map(str::to_owned).collect();
    if let Some(last) = words.last_mut() {
        *last = singularize(last);
    }
    words.join(" ")
}

/// Singular form of a single lowercase English word
#[must_use]
pub fn singularize(word: &str) -> String {
    if word.chars().count() < 3 || !word.is_ascii() || UNCOUNTABLE.contains(&word) {
        return word.to_owned();
    }
    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
        return (*singular).to_owned();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{stem}o");
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_owned();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_owned();
    }
    word.strip_suffix('s').unwrap_or(word).to_owned()
}

/// Lowercase alphanumeric tokens of a name, each singularized
#[must_use]
pub fn tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(singularize)
        .collect()
}

/// Whether `name` contains `term` as a whole word sequence (after singularization)
#[must_use]
pub fn contains_term(name: &str, term: &str) -> bool {
    let haystack = tokens(name);
    let needle = tokens(term);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

const CATEGORY_KEYWORDS: &[(IngredientCategory, &[&str])] = &[
    (
        IngredientCategory::Protein,
        &[
            "chicken", "beef", "pork", "lamb", "turkey", "duck", "fish", "salmon", "tuna", "cod",
            "shrimp", "prawn", "egg", "tofu", "tempeh", "bean", "lentil", "chickpea", "bacon",
            "ham", "sausage", "steak", "mince",
        ],
    ),
    (
        IngredientCategory::Dairy,
        &["milk", "cheese", "butter", "cream", "yogurt", "yoghurt", "ghee", "buttermilk"],
    ),
    (
        IngredientCategory::Grain,
        &[
            "flour", "rice", "pasta", "spaghetti", "noodle", "bread", "oat", "oats", "wheat",
            "barley", "quinoa", "couscous", "cornmeal", "semolina",
        ],
    ),
    (
        IngredientCategory::Vegetable,
        &[
            "carrot", "onion", "garlic", "tomato", "potato", "pepper", "lettuce", "spinach",
            "cabbage", "broccoli", "celery", "cucumber", "zucchini", "mushroom", "kale", "leek",
            "pea", "eggplant", "squash", "pumpkin", "corn", "shallot", "scallion", "apple",
            "banana", "lemon", "lime", "orange", "berry", "grape", "avocado",
        ],
    ),
];

/// Guess a coarse category from keywords in the name
#[must_use]
pub fn guess_category(name: &str) -> IngredientCategory {
    let words = tokens(name);
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            words.iter().any(|word| {
                keywords
                    .iter()
                    .any(|kw| word == kw || (kw.len() >= 5 && word.ends_with(kw)))
            })
        })
        .map_or(IngredientCategory::Other, |(category, _)| *category)
}
