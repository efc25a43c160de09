//! Directed, typed relations between entity names

use super::{is_unset, null_as_empty};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed edge `from -[relation_type]-> to`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(default)]
    pub id: String,
    pub from: String,
    pub to: String,
    pub relation_type: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
            created_at: Utc::now(),
        }
    }

    /// Fill in a missing ID or timestamp
    pub fn populate_defaults(&mut self) {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        if is_unset(&self.created_at) {
            self.created_at = Utc::now();
        }
    }

    /// True if either endpoint is `name`
    pub fn involves(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

/// The single persisted collection of all relations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationSet {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relations: Vec<Relation>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new relation; uniqueness is the caller's concern
    pub fn add_relation(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> &Relation {
        self.relations.push(Relation::new(from, to, relation_type));
        &self.relations[self.relations.len() - 1]
    }

    /// Remove the first relation with `id`; returns whether one was found
    pub fn remove_relation(&mut self, id: &str) -> bool {
        match self.relations.iter().position(|r| r.id == id) {
            Some(index) => {
                self.relations.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Relation> {
        self.relations.iter_mut().find(|r| r.id == id)
    }

    /// Relations where `name` is either endpoint
    pub fn relations_by_entity(&self, name: &str) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.involves(name)).collect()
    }

    pub fn relations_by_type(&self, relation_type: &str) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|r| r.relation_type == relation_type)
            .collect()
    }

    /// Whether an identical `(from, to, type)` edge is already present
    pub fn contains_edge(&self, from: &str, to: &str, relation_type: &str) -> bool {
        self.relations
            .iter()
            .any(|r| r.from == from && r.to == to && r.relation_type == relation_type)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn populate_defaults(&mut self) {
        for relation in &mut self.relations {
            relation.populate_defaults();
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}
