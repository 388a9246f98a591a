//! Explicit runtime configuration. Nothing below the binary reaches for a
//! default path on its own; callers build a `Config` and pass it down.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the database location.
pub const DB_ENV: &str = "AQUARIUM_DB";
/// Environment variable that sets the fallback log filter.
pub const LOG_ENV: &str = "AQUARIUM_LOG";
/// SQLite file used when `AQUARIUM_DB` is unset, relative to the working
/// directory.
pub const DEFAULT_DB_FILE: &str = "aquarium.db";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Config {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Build the configuration from `AQUARIUM_DB` and `AQUARIUM_LOG`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup(DB_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
        let log_level = lookup(LOG_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Self { db_path, log_level }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
