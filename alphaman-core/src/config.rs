//! Feed configuration — the date range and the files to load into it.
//!
//! Stored as a TOML file:
//!
//! ```toml
//! [feed]
//! start_date = "2020-01-01"
//! end_date = "2020-12-31"
//! trim = true
//!
//! [[daily]]
//! symbol = "ABC"
//! path = "data/abc.csv"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATE_COLUMN: &str = "Date";

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}

/// The `[feed]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedSection {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Column holding each row's date key.
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// Drop non-tradable days after loading.
    #[serde(default)]
    pub trim: bool,
}

/// One file to load for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFile {
    pub symbol: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    pub feed: FeedSection,
    #[serde(default)]
    pub daily: Vec<SourceFile>,
    #[serde(default)]
    pub quarterly: Vec<SourceFile>,
}

impl FeedConfig {
    /// Load a feed config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a feed config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.end_date < self.feed.start_date {
            return Err(ConfigError::Invalid(format!(
                "end_date {} precedes start_date {}",
                self.feed.end_date, self.feed.start_date
            )));
        }
        let mut seen = HashSet::new();
        for source in &self.daily {
            if !seen.insert(source.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "daily symbol '{}' listed more than once",
                    source.symbol
                )));
            }
        }
        Ok(())
    }

    /// Symbols with a daily source, in file order.
    pub fn daily_symbols(&self) -> Vec<&str> {
        self.daily.iter().map(|s| s.symbol.as_str()).collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
