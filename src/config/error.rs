//! Error types for configuration resolution

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to expand path {path}: {message}")]
    Expand { path: String, message: String },

    #[error("search.default_limit must be greater than zero")]
    ZeroSearchLimit,

    #[error("data directory {} exists but is not a directory", path.display())]
    NotADirectory { path: PathBuf },
}
