// ABOUTME: Core types and constants for the Larder culinary engine
// ABOUTME: Foundation crate with error handling, domain models, and tuning constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

#![deny(unsafe_code)]

//! # Larder Core
//!
//! Foundation crate providing shared types and constants for the Larder
//! ingredient, nutrition, and recipe scaling engine. Nothing in here performs
//! I/O, so the crate changes rarely and compiles once for the whole workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ProviderError`
//! - **constants**: Matching thresholds, nutrition defaults, and scaling tolerances
//! - **models**: Ingredients, aliases, nutrition records, and recipes

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (Ingredient, NutritionRecord, Recipe, etc.)
pub mod models;
