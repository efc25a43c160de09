//! File-backed entity/relation store
//!
//! One JSON file per entity plus a single aggregate relations file, with a
//! per-path lock registry and a process-wide read cache.
//!
//! # Example
//!
//! ```ignore
//! use memory_context::model::Entity;
//! use memory_context::store::{FileStore, MemoryStore};
//!
//! let store = FileStore::new("/tmp/memory");
//! store.initialize()?;
//!
//! let mut entity = Entity::new("project_standards", "guideline");
//! entity.add_observation("use conventional commits");
//! store.create_entity(entity)?;
//!
//! let hits = store.search_observations("commit", None)?;
//! ```

mod cache;
mod error;
mod file_store;
mod layout;
mod locks;

pub use cache::StoreCache;
pub use error::{Resource, StoreError, StoreResult};
pub use file_store::{FileStore, FileStoreOptions};
pub use layout::StoreLayout;
pub use locks::LockRegistry;

use crate::model::{Entity, Observation, RelationSet};
use serde::{Deserialize, Serialize};

/// One matching observation together with the entity that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub entity_name: String,
    pub entity_type: String,
    pub observation: Observation,
}

/// Entity/relation storage capability
///
/// All operations are blocking and run to completion once started.
pub trait MemoryStore: Send + Sync {
    /// Create the directory layout; safe to call repeatedly
    fn initialize(&self) -> StoreResult<()>;

    /// Validate and persist a new entity; fails if the name is taken
    fn create_entity(&self, entity: Entity) -> StoreResult<Entity>;

    fn get_entity(&self, name: &str) -> StoreResult<Entity>;

    /// Overwrite an existing entity in full
    fn update_entity(&self, entity: Entity) -> StoreResult<Entity>;

    /// Remove an entity; a missing entity is not an error
    fn delete_entity(&self, name: &str) -> StoreResult<()>;

    /// All readable entities, optionally restricted to one type
    fn list_entities(&self, entity_type: Option<&str>) -> StoreResult<Vec<Entity>>;

    /// Presence check that bypasses the cache
    fn entity_exists(&self, name: &str) -> bool;

    fn get_relations(&self) -> StoreResult<RelationSet>;

    /// Replace the whole relation set
    fn save_relations(&self, relations: RelationSet) -> StoreResult<RelationSet>;

    fn clear_cache(&self);

    /// Check that the backing storage is reachable
    fn ping(&self) -> StoreResult<()>;

    /// Case-insensitive substring search across entities
    fn search_observations(
        &self,
        query: &str,
        entity_type: Option<&str>,
    ) -> StoreResult<Vec<SearchResult>> {
        let entities = self.list_entities(entity_type)?;

        let results = entities
            .iter()
            .flat_map(|entity| {
                entity
                    .search_observations(query)
                    .into_iter()
                    .map(move |observation| SearchResult {
                        entity_name: entity.name.clone(),
                        entity_type: entity.entity_type.clone(),
                        observation: observation.clone(),
                    })
            })
            .collect();

        Ok(results)
    }
}
