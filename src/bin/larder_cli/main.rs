// ABOUTME: Larder CLI - command-line access to conversion, search, resolution, nutrition and scaling
// ABOUTME: Every command prints its result as pretty JSON on stdout; logs go to stderr
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence
//!
//! Usage:
//! ```bash
//! # Convert between units
//! larder-cli convert 2 cup tbsp
//!
//! # Search the ingredient catalogue
//! larder-cli search tomat
//!
//! # Resolve a name to one ingredient
//! larder-cli resolve "Roma Tomatoes"
//!
//! # Per-100g nutrition through the lookup tiers
//! larder-cli lookup "chicken breast" --language en
//!
//! # Scale a recipe file to 6 servings, or around one ingredient
//! larder-cli scale recipe.json --servings 6
//! larder-cli scale recipe.json --anchor flour --amount 300 --unit g
//!
//! # Recipe nutrition totals
//! larder-cli nutrition recipe.json
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use larder::config::{DatabaseConfig, LarderConfig};
use larder::logging::LoggingConfig;
use larder::Larder;

#[derive(Parser)]
#[command(
    name = "larder-cli",
    about = "Larder ingredient and recipe toolkit",
    long_about = "Resolve ingredients, convert units, look up nutrition and scale recipes from the command line."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override (`sqlite:./larder.db`, `sqlite::memory:`, `memory`)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an amount between units
    Convert {
        /// Amount to convert
        amount: f64,
        /// Source unit
        from: String,
        /// Target unit
        to: String,
    },

    /// Search ingredients by name
    Search {
        /// Query text
        query: String,

        /// Maximum results
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Resolve a name to one canonical ingredient
    Resolve {
        /// Ingredient name as written
        name: String,
    },

    /// Per-100g nutrition for an ingredient name
    Lookup {
        /// Ingredient name as written
        name: String,

        /// Language of the name
        #[arg(long)]
        language: Option<String>,
    },

    /// Scale a recipe JSON file
    Scale {
        /// Recipe JSON file
        recipe: PathBuf,

        /// Target servings
        #[arg(long, required_unless_present = "anchor", conflicts_with = "anchor")]
        servings: Option<f64>,

        /// Line id of the anchor ingredient
        #[arg(long, requires = "amount")]
        anchor: Option<String>,

        /// Target amount of the anchor ingredient
        #[arg(long, requires = "anchor")]
        amount: Option<f64>,

        /// Unit of the target amount (defaults to the anchor's unit)
        #[arg(long, requires = "anchor")]
        unit: Option<String>,
    },

    /// Total and per-serving nutrition of a recipe JSON file
    Nutrition {
        /// Recipe JSON file
        recipe: PathBuf,
    },

    /// Record grams per unit for an ingredient
    Override {
        /// Ingredient name
        name: String,
        /// Unit symbol
        unit: String,
        /// Grams in one unit
        grams: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".into();
    }
    logging.init()?;

    let mut config = LarderConfig::from_env();
    if let Some(url) = cli.database_url.as_deref() {
        config.database = DatabaseConfig::with_url(url);
    }

    match cli.command {
        Command::Convert { amount, from, to } => commands::convert(amount, &from, &to),
        command => {
            let larder = Larder::from_config(config).await?;
            run(&larder, command).await
        }
    }
}

async fn run(larder: &Larder, command: Command) -> Result<()> {
    match command {
        Command::Convert { amount, from, to } => commands::convert(amount, &from, &to),
        Command::Search { query, limit } => commands::search(larder, &query, limit).await,
        Command::Resolve { name } => commands::resolve(larder, &name).await,
        Command::Lookup { name, language } => {
            commands::lookup(larder, &name, language.as_deref()).await
        }
        Command::Scale {
            recipe,
            servings,
            anchor,
            amount,
            unit,
        } => {
            let target = match (servings, anchor, amount) {
                (Some(servings), _, _) => commands::ScaleTarget::Servings(servings),
                (None, Some(line_id), Some(amount)) => commands::ScaleTarget::Anchor {
                    line_id,
                    amount,
                    unit,
                },
                _ => anyhow::bail!("pass --servings, or --anchor with --amount"),
            };
            commands::scale(larder, &recipe, target).await
        }
        Command::Nutrition { recipe } => commands::nutrition(larder, &recipe).await,
        Command::Override { name, unit, grams } => {
            commands::unit_override(larder, &name, &unit, grams).await
        }
    }
}
