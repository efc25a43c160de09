//! Store error taxonomy

use crate::model::ValidationError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// What kind of record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Entity,
    Relation,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Entity => write!(f, "entity"),
            Resource::Relation => write!(f, "relation"),
        }
    }
}

/// Errors returned by every store operation
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected before any I/O
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{resource} '{key}' already exists")]
    AlreadyExists { resource: Resource, key: String },

    #[error("{resource} '{key}' not found")]
    NotFound { resource: Resource, key: String },

    /// File is present but does not parse; it is left on disk untouched
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode {resource}: {source}")]
    Encode {
        resource: Resource,
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl StoreError {
    pub fn entity_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: Resource::Entity,
            key: name.into(),
        }
    }

    pub fn entity_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: Resource::Entity,
            key: name.into(),
        }
    }

    pub fn relation_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: Resource::Relation,
            key: id.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
