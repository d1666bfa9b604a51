// ABOUTME: Pure culinary algorithms shared by the resolver, aggregator, and scaler
// ABOUTME: Unit conversion graph, whole-item policy, text normalization, similarity, and scaling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

#![deny(unsafe_code)]

//! # Larder Culinary
//!
//! Everything in this crate is synchronous and free of I/O. The root crate
//! layers persistence and network tiers on top.
//!
//! ```rust
//! use larder_culinary::units::UnitGraph;
//!
//! let graph = UnitGraph::standard();
//! assert!((graph.convert(2.0, "cup", "tbsp") - 32.0).abs() < 1e-9);
//! ```

/// Weighted unit graph with BFS path resolution
pub mod units;

/// Count-based ingredient handling (eggs, onions, cloves)
pub mod whole_items;

/// Name normalization, singularization, and category guessing
pub mod text;

/// Trigram and edit-distance string similarity
pub mod similarity;

/// Density and per-item weight heuristics for gram estimates
pub mod heuristics;

/// Recipe scaling with cooking and baking rounding policies
pub mod scaling;

pub use heuristics::{density_g_per_ml, estimate_grams, grams_per_item};
pub use scaling::{RecipeScaler, ScaledGroup, ScaledLine, ScaledRecipe, ScalingPolicy};
pub use units::{canonical_unit, UnitGraph, UnitKind};
pub use whole_items::{WholeItemOutcome, WholeItemPolicy};
