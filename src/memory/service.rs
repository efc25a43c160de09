//! Memory service
//!
//! Multi-step operations (get-or-create, endpoint checks before relating,
//! relation pruning) built on top of the store primitives. Mutating operations
//! serialize on a service-wide mutex so their check-then-write sequences are
//! consistent within one process.

use crate::model::{Entity, Observation, Relation, ValidationError};
use crate::store::{MemoryStore, Resource, SearchResult, StoreError, StoreResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Entity type used by `remember` when none is supplied
pub const DEFAULT_ENTITY_TYPE: &str = "memory";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RememberRequest {
    pub entity_name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    pub observation: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remembered {
    pub entity_name: String,
    /// True when the entity did not exist before this call
    pub created: bool,
    pub observation: Observation,
}

/// Lookup by name, then search by query, then list; first non-empty field wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallQuery {
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Recall {
    Entity(Entity),
    Matches(Vec<SearchResult>),
    Entities(Vec<Entity>),
}

/// Replacement fields for an existing entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRevision {
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Replaces every observation when present
    #[serde(default)]
    pub observations: Option<Vec<String>>,
}

/// AND filter; unset or empty fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationFilter {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub relation_type: Option<String>,
}

impl RelationFilter {
    fn matches(&self, relation: &Relation) -> bool {
        field_matches(self.from.as_deref(), &relation.from)
            && field_matches(self.to.as_deref(), &relation.to)
            && field_matches(self.relation_type.as_deref(), &relation.relation_type)
    }
}

/// Partial update; unset or empty fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationPatch {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub relation_type: Option<String>,
}

pub struct MemoryService {
    store: Arc<dyn MemoryStore>,
    writes: Mutex<()>,
}

impl MemoryService {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    fn serialize_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an observation to an entity, creating the entity first if needed
    pub fn remember(&self, request: RememberRequest) -> StoreResult<Remembered> {
        require("entityName", &request.entity_name)?;
        require("observation", &request.observation)?;

        let _writes = self.serialize_writes();

        let existing = match self.store.get_entity(&request.entity_name) {
            Ok(entity) => Some(entity),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        let created = existing.is_none();

        let mut entity = existing.unwrap_or_else(|| {
            let entity_type =
                non_empty(request.entity_type.as_deref()).unwrap_or(DEFAULT_ENTITY_TYPE);
            Entity::new(request.entity_name.as_str(), entity_type)
        });

        let observation = match non_empty(request.source.as_deref()) {
            Some(source) => entity.add_observation_with_source(request.observation.as_str(), source),
            None => entity.add_observation(request.observation.as_str()),
        }
        .clone();

        if created {
            self.store.create_entity(entity)?;
        } else {
            self.store.update_entity(entity)?;
        }

        tracing::info!(
            entity = %request.entity_name,
            created,
            observation_id = %observation.id,
            "Remembered observation"
        );

        Ok(Remembered {
            entity_name: request.entity_name,
            created,
            observation,
        })
    }

    /// Append an observation to an existing entity
    pub fn add_observation(
        &self,
        name: &str,
        text: &str,
        source: Option<&str>,
    ) -> StoreResult<Observation> {
        require("text", text)?;

        let _writes = self.serialize_writes();
        let mut entity = self.store.get_entity(name)?;
        let observation = match non_empty(source) {
            Some(source) => entity.add_observation_with_source(text, source),
            None => entity.add_observation(text),
        }
        .clone();

        self.store.update_entity(entity)?;
        Ok(observation)
    }

    pub fn create_entity(
        &self,
        name: &str,
        entity_type: &str,
        observations: &[String],
    ) -> StoreResult<Entity> {
        let mut entity = Entity::new(name, entity_type);
        for text in observations.iter().filter(|t| !t.is_empty()) {
            entity.add_observation(text.as_str());
        }

        let entity = self.store.create_entity(entity)?;
        tracing::info!(entity = %entity.name, entity_type = %entity.entity_type, "Created entity");
        Ok(entity)
    }

    pub fn get_entity(&self, name: &str) -> StoreResult<Entity> {
        self.store.get_entity(name)
    }

    pub fn list_entities(&self, entity_type: Option<&str>) -> StoreResult<Vec<Entity>> {
        self.store.list_entities(entity_type)
    }

    /// Replace the type and/or the full observation list of an entity
    pub fn revise_entity(&self, name: &str, revision: EntityRevision) -> StoreResult<Entity> {
        let _writes = self.serialize_writes();
        let mut entity = self.store.get_entity(name)?;

        if let Some(entity_type) = non_empty(revision.entity_type.as_deref()) {
            entity.entity_type = entity_type.to_string();
        }
        if let Some(texts) = revision.observations {
            entity.observations = texts
                .into_iter()
                .filter(|t| !t.is_empty())
                .map(Observation::new)
                .collect();
        }
        entity.last_modified = Utc::now();

        self.store.update_entity(entity)
    }

    /// Delete an entity; relations that mention it are left in place
    pub fn forget(&self, name: &str) -> StoreResult<()> {
        let _writes = self.serialize_writes();
        if !self.store.entity_exists(name) {
            // surface name-policy violations as validation errors, not 404s
            self.store.get_entity(name)?;
            return Err(StoreError::entity_not_found(name));
        }

        self.store.delete_entity(name)?;
        tracing::info!(entity = %name, "Forgot entity");
        Ok(())
    }

    /// Remove relations whose endpoints no longer exist; returns how many went
    pub fn prune_dangling_relations(&self) -> StoreResult<usize> {
        let _writes = self.serialize_writes();
        let mut relations = self.store.get_relations()?;

        let before = relations.len();
        relations
            .relations
            .retain(|r| self.store.entity_exists(&r.from) && self.store.entity_exists(&r.to));
        let removed = before - relations.len();

        if removed > 0 {
            self.store.save_relations(relations)?;
            tracing::info!(removed, "Pruned dangling relations");
        }
        Ok(removed)
    }

    pub fn recall(&self, query: RecallQuery) -> StoreResult<Recall> {
        if let Some(name) = non_empty(query.entity_name.as_deref()) {
            return self.store.get_entity(name).map(Recall::Entity);
        }

        let entity_type = non_empty(query.entity_type.as_deref());
        if let Some(text) = non_empty(query.query.as_deref()) {
            return self
                .store
                .search_observations(text, entity_type)
                .map(Recall::Matches);
        }

        self.store.list_entities(entity_type).map(Recall::Entities)
    }

    /// Observation search; `limit` of zero or None means unlimited
    pub fn search(
        &self,
        query: &str,
        entity_type: Option<&str>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<SearchResult>> {
        require("query", query)?;

        let mut results = self
            .store
            .search_observations(query, non_empty(entity_type))?;
        if let Some(limit) = limit.filter(|n| *n > 0) {
            results.truncate(limit);
        }

        tracing::debug!(query, count = results.len(), "Searched observations");
        Ok(results)
    }

    /// Link two existing entities; the (from, to, type) triple must be new
    pub fn relate(&self, from: &str, to: &str, relation_type: &str) -> StoreResult<Relation> {
        require("from", from)?;
        require("to", to)?;
        require("relationType", relation_type)?;

        let _writes = self.serialize_writes();
        self.ensure_entity(from)?;
        self.ensure_entity(to)?;

        let mut relations = self.store.get_relations()?;
        if relations.contains_edge(from, to, relation_type) {
            return Err(StoreError::AlreadyExists {
                resource: Resource::Relation,
                key: format!("{} -[{}]-> {}", from, relation_type, to),
            });
        }

        let relation = relations.add_relation(from, to, relation_type).clone();
        self.store.save_relations(relations)?;

        tracing::info!(id = %relation.id, from, to, relation_type, "Created relation");
        Ok(relation)
    }

    pub fn list_relations(&self, filter: &RelationFilter) -> StoreResult<Vec<Relation>> {
        let relations = self.store.get_relations()?;
        Ok(relations
            .relations
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    pub fn get_relation(&self, id: &str) -> StoreResult<Relation> {
        let relations = self.store.get_relations()?;
        relations
            .find(id)
            .cloned()
            .ok_or_else(|| StoreError::relation_not_found(id))
    }

    pub fn update_relation(&self, id: &str, patch: RelationPatch) -> StoreResult<Relation> {
        let _writes = self.serialize_writes();
        let mut relations = self.store.get_relations()?;
        let current = relations
            .find(id)
            .ok_or_else(|| StoreError::relation_not_found(id))?;

        let from = non_empty(patch.from.as_deref());
        let to = non_empty(patch.to.as_deref());
        for endpoint in [from, to].into_iter().flatten() {
            self.ensure_entity(endpoint)?;
        }

        let mut updated = current.clone();
        if let Some(from) = from {
            updated.from = from.to_string();
        }
        if let Some(to) = to {
            updated.to = to.to_string();
        }
        if let Some(relation_type) = non_empty(patch.relation_type.as_deref()) {
            updated.relation_type = relation_type.to_string();
        }

        // the patched edge must not collide with any other relation
        let collides = relations.relations.iter().any(|r| {
            r.id != updated.id
                && r.from == updated.from
                && r.to == updated.to
                && r.relation_type == updated.relation_type
        });
        if collides {
            return Err(StoreError::AlreadyExists {
                resource: Resource::Relation,
                key: format!(
                    "{} -[{}]-> {}",
                    updated.from, updated.relation_type, updated.to
                ),
            });
        }

        let relation = relations
            .find_mut(id)
            .ok_or_else(|| StoreError::relation_not_found(id))?;
        *relation = updated.clone();

        self.store.save_relations(relations)?;
        tracing::info!(id, "Updated relation");
        Ok(updated)
    }

    pub fn unrelate(&self, id: &str) -> StoreResult<()> {
        let _writes = self.serialize_writes();
        let mut relations = self.store.get_relations()?;
        if !relations.remove_relation(id) {
            return Err(StoreError::relation_not_found(id));
        }

        self.store.save_relations(relations)?;
        tracing::info!(id, "Deleted relation");
        Ok(())
    }

    fn ensure_entity(&self, name: &str) -> StoreResult<()> {
        if self.store.entity_exists(name) {
            Ok(())
        } else {
            Err(StoreError::entity_not_found(name))
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn field_matches(filter: Option<&str>, value: &str) -> bool {
    non_empty(filter).is_none_or(|f| f == value)
}
