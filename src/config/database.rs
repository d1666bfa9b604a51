// ABOUTME: Database configuration types for the ingredient store
// ABOUTME: Parses SQLite file, SQLite in-memory, and process-local store URLs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Larder Culinary Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::env_var_or;

/// Default store: SQLite held in memory
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Where the ingredient store lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory `SQLite`
    Memory,
    /// Plain in-process store, no SQL engine
    InProcess,
}

impl DatabaseUrl {
    /// Parse a store URL.
    ///
    /// `memory` selects the in-process store, `sqlite::memory:` in-memory
    /// SQLite, and anything else is a SQLite file (with or without the
    /// `sqlite:` prefix).
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("memory") {
            return Self::InProcess;
        }
        let path = s.strip_prefix("sqlite://").or_else(|| s.strip_prefix("sqlite:")).unwrap_or(s);
        if path == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path),
            }
        }
    }

    /// Connection string understood by sqlx
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory | Self::InProcess => DEFAULT_DATABASE_URL.to_owned(),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::InProcess => f.write_str("memory"),
            other => f.write_str(&other.to_connection_string()),
        }
    }
}

/// Ingredient store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store URL (`LARDER_DATABASE_URL`)
    pub url: DatabaseUrl,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::Memory,
        }
    }
}

impl DatabaseConfig {
    /// Load from `LARDER_DATABASE_URL`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: DatabaseUrl::parse_url(&env_var_or("LARDER_DATABASE_URL", DEFAULT_DATABASE_URL)),
        }
    }

    /// Configuration for a given URL string
    #[must_use]
    pub fn with_url(url: &str) -> Self {
        Self {
            url: DatabaseUrl::parse_url(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_variants() {
        assert_eq!(DatabaseUrl::parse_url("memory"), DatabaseUrl::InProcess);
        assert_eq!(DatabaseUrl::parse_url("sqlite::memory:"), DatabaseUrl::Memory);
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/larder.db"),
            DatabaseUrl::SQLite {
                path: PathBuf::from("./data/larder.db")
            }
        );
        assert_eq!(
            DatabaseUrl::parse_url("larder.db").to_connection_string(),
            "sqlite:larder.db"
        );
    }
}
