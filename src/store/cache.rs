//! Process-wide read cache for entities and the relation set
//!
//! No eviction and no TTL: entries live until replaced by a write to the same
//! key or until `clear`. Out-of-band edits to the files are not observed.

use crate::model::{Entity, RelationSet};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct CacheState {
    entities: HashMap<String, Entity>,
    /// None until the relations file has been read or written
    relations: Option<RelationSet>,
}

#[derive(Debug, Default)]
pub struct StoreCache {
    state: RwLock<CacheState>,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entity(&self, name: &str) -> Option<Entity> {
        self.read().entities.get(name).cloned()
    }

    pub fn put_entity(&self, name: &str, entity: Entity) {
        self.write().entities.insert(name.to_string(), entity);
    }

    pub fn evict_entity(&self, name: &str) {
        self.write().entities.remove(name);
    }

    pub fn relations(&self) -> Option<RelationSet> {
        self.read().relations.clone()
    }

    pub fn put_relations(&self, relations: RelationSet) {
        self.write().relations = Some(relations);
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.entities.clear();
        state.relations = None;
    }

    pub fn entity_count(&self) -> usize {
        self.read().entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_evict() {
        let cache = StoreCache::new();
        assert!(cache.entity("a").is_none());

        cache.put_entity("a", Entity::new("a", "t"));
        assert_eq!(cache.entity("a").unwrap().entity_type, "t");
        assert_eq!(cache.entity_count(), 1);

        cache.put_entity("a", Entity::new("a", "replaced"));
        assert_eq!(cache.entity("a").unwrap().entity_type, "replaced");

        cache.evict_entity("a");
        assert!(cache.entity("a").is_none());
    }

    #[test]
    fn test_clear_drops_relations() {
        let cache = StoreCache::new();
        cache.put_entity("a", Entity::new("a", "t"));
        cache.put_relations(RelationSet::new());
        assert!(cache.relations().is_some());

        cache.clear();
        assert!(cache.relations().is_none());
        assert_eq!(cache.entity_count(), 0);
    }
}
