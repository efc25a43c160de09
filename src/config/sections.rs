//! Individual configuration tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// `[storage]`
///
/// Fields stay `None` unless a layer sets them, so a later layer can restore a
/// default that an earlier one changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Base directory for entity and relation files; `~` and `$VAR` are expanded
    pub data_dir: Option<String>,

    /// Write through a temp file and rename (default true)
    pub atomic_writes: Option<bool>,
}

impl StorageConfig {
    pub fn use_atomic_writes(&self) -> bool {
        self.atomic_writes.unwrap_or(true)
    }
}

/// `[logging]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<LogLevel>,

    /// Append log lines to this file in addition to stderr
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// `[search]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Result cap applied when a search does not ask for one
    pub default_limit: Option<usize>,
}

pub const DEFAULT_SEARCH_LIMIT: usize = 50;

impl SearchConfig {
    pub fn limit(&self) -> usize {
        self.default_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }
}
