//! CLI command implementations
//!
//! Each command reports through the output handler and returns a process exit
//! code: 0 on success, 2 for invalid input, 3 for a missing entity or relation,
//! 4 for a conflict and 1 for storage failures.

use super::output::{OutputEvent, OutputHandler};
use crate::config::{ConfigError, MemoryConfig};
use crate::memory::{MemoryService, Recall, RecallQuery, RelationFilter, RememberRequest};
use crate::model::Validator;
use crate::store::{FileStore, FileStoreOptions, MemoryStore, StoreError, StoreResult};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolve the data directory from config and open an initialized store over it
pub fn open_service(config: &MemoryConfig) -> Result<(MemoryService, PathBuf)> {
    let data_dir = config.data_dir()?;
    if data_dir.exists() && !data_dir.is_dir() {
        return Err(ConfigError::NotADirectory { path: data_dir }.into());
    }

    let store = FileStore::with_options(
        &data_dir,
        Validator::default(),
        FileStoreOptions {
            atomic_writes: config.storage.use_atomic_writes(),
        },
    );
    store
        .initialize()
        .with_context(|| format!("initializing store at {}", data_dir.display()))?;

    Ok((MemoryService::new(Arc::new(store)), data_dir))
}

/// Short machine-readable category for an error
pub fn error_kind(error: &StoreError) -> &'static str {
    match error {
        StoreError::Validation(_) => "validation",
        StoreError::NotFound { .. } => "not_found",
        StoreError::AlreadyExists { .. } => "already_exists",
        StoreError::Decode { .. } | StoreError::Encode { .. } => "serialization",
        StoreError::Io { .. } => "io",
    }
}

pub fn exit_code(error: &StoreError) -> i32 {
    match error {
        StoreError::Validation(_) => 2,
        StoreError::NotFound { .. } => 3,
        StoreError::AlreadyExists { .. } => 4,
        _ => 1,
    }
}

fn report(handler: &dyn OutputHandler, outcome: StoreResult<OutputEvent>) -> i32 {
    match outcome {
        Ok(event) => {
            handler.emit(event);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            handler.emit(OutputEvent::Error {
                kind: error_kind(&e),
                message: e.to_string(),
            });
            exit_code(&e)
        }
    }
}

/// Verify the store is reachable and report where it lives
pub fn init(service: &MemoryService, data_dir: &Path, handler: &dyn OutputHandler) -> i32 {
    let outcome = service.store().ping().map(|()| OutputEvent::Initialized {
        data_dir: data_dir.display().to_string(),
    });
    report(handler, outcome)
}

pub fn remember(
    service: &MemoryService,
    request: RememberRequest,
    handler: &dyn OutputHandler,
) -> i32 {
    let outcome = service
        .remember(request)
        .map(|remembered| OutputEvent::Remembered {
            entity: remembered.entity_name,
            created: remembered.created,
            observation: remembered.observation,
        });
    report(handler, outcome)
}

pub fn recall(service: &MemoryService, query: RecallQuery, handler: &dyn OutputHandler) -> i32 {
    let search_text = query.query.clone().unwrap_or_default();
    let entity_type = query.entity_type.clone().filter(|t| !t.is_empty());

    let outcome = service.recall(query).map(|recall| match recall {
        Recall::Entity(entity) => OutputEvent::Entity { entity },
        Recall::Matches(results) => OutputEvent::SearchResults {
            query: search_text,
            results,
        },
        Recall::Entities(entities) => OutputEvent::Entities {
            entity_type,
            entities,
        },
    });
    report(handler, outcome)
}

/// Search observations; `limit` falls back to the configured default
pub fn search(
    service: &MemoryService,
    query: &str,
    entity_type: Option<&str>,
    limit: Option<usize>,
    config: &MemoryConfig,
    handler: &dyn OutputHandler,
) -> i32 {
    let limit = limit.unwrap_or_else(|| config.search.limit());
    let outcome = service
        .search(query, entity_type, Some(limit))
        .map(|results| OutputEvent::SearchResults {
            query: query.to_string(),
            results,
        });
    report(handler, outcome)
}

pub fn forget(service: &MemoryService, name: &str, handler: &dyn OutputHandler) -> i32 {
    let outcome = service.forget(name).map(|()| OutputEvent::Forgotten {
        entity: name.to_string(),
    });
    report(handler, outcome)
}

pub fn relate(
    service: &MemoryService,
    from: &str,
    to: &str,
    relation_type: &str,
    handler: &dyn OutputHandler,
) -> i32 {
    let outcome = service
        .relate(from, to, relation_type)
        .map(|relation| OutputEvent::Related { relation });
    report(handler, outcome)
}

pub fn unrelate(service: &MemoryService, id: &str, handler: &dyn OutputHandler) -> i32 {
    let outcome = service
        .unrelate(id)
        .map(|()| OutputEvent::Unrelated { id: id.to_string() });
    report(handler, outcome)
}

pub fn relations(
    service: &MemoryService,
    filter: &RelationFilter,
    handler: &dyn OutputHandler,
) -> i32 {
    let outcome = service
        .list_relations(filter)
        .map(|relations| OutputEvent::Relations { relations });
    report(handler, outcome)
}

pub fn entities(
    service: &MemoryService,
    entity_type: Option<&str>,
    handler: &dyn OutputHandler,
) -> i32 {
    let outcome = service
        .list_entities(entity_type)
        .map(|entities| OutputEvent::Entities {
            entity_type: entity_type.filter(|t| !t.is_empty()).map(str::to_string),
            entities,
        });
    report(handler, outcome)
}

pub fn prune(service: &MemoryService, handler: &dyn OutputHandler) -> i32 {
    let outcome = service
        .prune_dangling_relations()
        .map(|removed| OutputEvent::Pruned { removed });
    report(handler, outcome)
}
