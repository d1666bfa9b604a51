// ABOUTME: Main library entry point for the Larder culinary engine
// ABOUTME: Ingredient resolution, unit conversion, nutrition aggregation and recipe scaling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

#![deny(unsafe_code)]

//! # Larder
//!
//! Resolves free-text ingredient names to canonical ingredients, converts
//! between kitchen units, aggregates recipe nutrition from tiered sources and
//! rescales recipes with cooking- or baking-appropriate rounding.
//!
//! ## Architecture
//!
//! - **`larder-core`**: errors, constants and domain models
//! - **`larder-culinary`**: pure algorithms (unit graph, whole items, scaling)
//! - **this crate**: configuration, logging, storage, outbound providers and
//!   the async resolver and aggregator, composed by [`Larder`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use larder::config::LarderConfig;
//! use larder::Larder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     larder::logging::init_from_env()?;
//!     let larder = Larder::from_config(LarderConfig::from_env()).await?;
//!     println!("2 cups = {} tbsp", larder.convert_unit(2.0, "cup", "tbsp"));
//!     Ok(())
//! }
//! ```

/// Configuration loaded from environment variables
pub mod config;

/// Ingredient store trait with SQLite and in-memory implementations
pub mod database;

/// External nutrition data sources
pub mod external;

/// Ingredient resolution, nutrition lookup and estimation
pub mod intelligence;

/// LLM providers used for generative nutrition estimates
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Minimum-interval rate limiting for outbound calls
pub mod rate_limiting;

mod larder;

pub use larder::Larder;

/// Unified error handling (re-exported from `larder-core`)
pub use larder_core::errors;

/// Domain constants (re-exported from `larder-core`)
pub use larder_core::constants;

/// Domain models (re-exported from `larder-core`)
pub use larder_core::models;

/// Pure culinary algorithms
pub use larder_culinary as culinary;
