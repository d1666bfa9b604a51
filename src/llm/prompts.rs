// ABOUTME: Fixed prompts for generative per-100g nutrition estimates
// ABOUTME: The system prompt pins the JSON shape the estimate parser expects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

/// System prompt for nutrition estimates
pub const NUTRITION_ESTIMATE_SYSTEM_PROMPT: &str = "You are a nutrition database. \
Given an ingredient name, estimate its nutritional content per 100 grams of the raw ingredient. \
Respond with a single JSON object and nothing else, using exactly these keys with numeric values: \
{\"calories\": number, \"protein_g\": number, \"carbs_g\": number, \"fat_g\": number, \"fiber_g\": number}";

/// User message asking for an estimate of `name`
#[must_use]
pub fn estimate_user_prompt(name: &str) -> String {
    format!("Estimate nutrition per 100g for: {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_names_ingredient() {
        assert_eq!(
            estimate_user_prompt("kohlrabi"),
            "Estimate nutrition per 100g for: kohlrabi"
        );
        assert!(NUTRITION_ESTIMATE_SYSTEM_PROMPT.contains("fiber_g"));
    }
}
