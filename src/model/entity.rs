//! Entities and their observations

use super::validation::{ValidationError, Validator};
use super::{is_unset, null_as_empty};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source recorded when a caller does not supply one
pub const DEFAULT_SOURCE: &str = "user_input";

/// A named container of atomic facts, keyed by `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub entity_type: String,

    /// Insertion order is meaningful and preserved on disk
    #[serde(default, deserialize_with = "null_as_empty")]
    pub observations: Vec<Observation>,

    #[serde(default)]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_modified: DateTime<Utc>,
}

/// A single atomic fact attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source: String,
}

impl Observation {
    /// Create an observation with a fresh ID and the default source
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_source(text, DEFAULT_SOURCE)
    }

    /// Create an observation with a fresh ID and an explicit source
    pub fn with_source(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            created_at: Utc::now(),
            source: source.into(),
        }
    }

    /// Fill in a missing ID, timestamp or source
    pub fn populate_defaults(&mut self) {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        if is_unset(&self.created_at) {
            self.created_at = Utc::now();
        }
        if self.source.is_empty() {
            self.source = DEFAULT_SOURCE.to_string();
        }
    }

    fn matches(&self, needle_lower: &str) -> bool {
        self.text.to_lowercase().contains(needle_lower)
    }
}

impl Entity {
    /// Create an entity with no observations, both timestamps set to now
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            observations: Vec::new(),
            created_at: now,
            last_modified: now,
        }
    }

    /// Append an observation with the default source
    pub fn add_observation(&mut self, text: impl Into<String>) -> &Observation {
        self.push(Observation::new(text))
    }

    /// Append an observation attributed to `source`
    pub fn add_observation_with_source(
        &mut self,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> &Observation {
        self.push(Observation::with_source(text, source))
    }

    fn push(&mut self, observation: Observation) -> &Observation {
        self.observations.push(observation);
        self.last_modified = Utc::now();
        // just pushed, never empty
        &self.observations[self.observations.len() - 1]
    }

    /// Remove the first observation with `id`; returns whether one was found
    pub fn remove_observation(&mut self, id: &str) -> bool {
        match self.observations.iter().position(|o| o.id == id) {
            Some(index) => {
                self.observations.remove(index);
                self.last_modified = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Look up an observation by ID
    pub fn observation(&self, id: &str) -> Option<&Observation> {
        self.observations.iter().find(|o| o.id == id)
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Observations whose text contains `query`, ignoring case, in original order
    pub fn search_observations(&self, query: &str) -> Vec<&Observation> {
        let needle = query.to_lowercase();
        self.observations
            .iter()
            .filter(|o| o.matches(&needle))
            .collect()
    }

    /// True when `filter` is absent, empty, or equal to this entity's type
    pub fn matches_type(&self, filter: Option<&str>) -> bool {
        match filter {
            None | Some("") => true,
            Some(t) => self.entity_type == t,
        }
    }

    /// Fill in missing timestamps and observation defaults
    pub fn populate_defaults(&mut self) {
        let now = Utc::now();
        if is_unset(&self.created_at) {
            self.created_at = now;
        }
        if is_unset(&self.last_modified) {
            self.last_modified = now;
        }
        for observation in &mut self.observations {
            observation.populate_defaults();
        }
    }

    /// Populate defaults, then check every field against `validator`
    pub fn validate(&mut self, validator: &Validator) -> Result<(), ValidationError> {
        self.populate_defaults();
        validator.validate_entity(self)
    }

    /// Compact JSON, the on-disk representation
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity() {
        let entity = Entity::new("project_standards", "guideline");

        assert_eq!(entity.name, "project_standards");
        assert_eq!(entity.entity_type, "guideline");
        assert_eq!(entity.observation_count(), 0);
        assert!(!is_unset(&entity.created_at));
        assert_eq!(entity.created_at, entity.last_modified);
    }

    #[test]
    fn test_add_observation_uses_default_source() {
        let mut entity = Entity::new("project_standards", "guideline");
        let before = entity.last_modified;

        let obs = entity.add_observation("use conventional commits").clone();

        assert_eq!(entity.observation_count(), 1);
        assert_eq!(obs.text, "use conventional commits");
        assert_eq!(obs.source, DEFAULT_SOURCE);
        assert!(Uuid::parse_str(&obs.id).is_ok());
        assert!(entity.last_modified >= before);
    }

    #[test]
    fn test_add_observation_with_source() {
        let mut entity = Entity::new("api_patterns", "pattern");
        entity.add_observation_with_source("use REST endpoints", "code_analysis");

        assert_eq!(entity.observations[0].source, "code_analysis");
    }

    #[test]
    fn test_observation_ordering_and_removal() {
        let mut entity = Entity::new("ordering", "test");
        let a = entity.add_observation("a").id.clone();
        entity.add_observation("b");

        let texts: Vec<_> = entity.observations.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);

        assert!(entity.remove_observation(&a));
        let texts: Vec<_> = entity.observations.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["b"]);

        assert!(!entity.remove_observation("no-such-id"));
        assert_eq!(entity.observation_count(), 1);
    }

    #[test]
    fn test_duplicate_texts_are_kept() {
        let mut entity = Entity::new("dupes", "test");
        entity.add_observation("same");
        entity.add_observation("same");

        assert_eq!(entity.observation_count(), 2);
        assert_ne!(entity.observations[0].id, entity.observations[1].id);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut entity = Entity::new("project_standards", "guideline");
        entity.add_observation("use conventional commits");
        entity.add_observation("format: type(scope): description");
        entity.add_observation("use REST API patterns");

        let results = entity.search_observations("COMMIT");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "use conventional commits");

        let results = entity.search_observations("use");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "use conventional commits");
        assert_eq!(results[1].text, "use REST API patterns");
    }

    #[test]
    fn test_matches_type() {
        let entity = Entity::new("x", "guideline");
        assert!(entity.matches_type(None));
        assert!(entity.matches_type(Some("")));
        assert!(entity.matches_type(Some("guideline")));
        assert!(!entity.matches_type(Some("pattern")));
    }

    #[test]
    fn test_populate_defaults_fills_missing_fields() {
        let json = r#"{
            "name": "imported",
            "entityType": "note",
            "observations": [{"text": "no id yet"}]
        }"#;
        let mut entity = Entity::from_json(json.as_bytes()).unwrap();
        assert!(is_unset(&entity.created_at));
        assert!(entity.observations[0].id.is_empty());

        entity.populate_defaults();

        assert!(!is_unset(&entity.created_at));
        assert!(!is_unset(&entity.last_modified));
        let obs = &entity.observations[0];
        assert!(Uuid::parse_str(&obs.id).is_ok());
        assert!(!is_unset(&obs.created_at));
        assert_eq!(obs.source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_populate_defaults_keeps_existing_values() {
        let mut entity = Entity::new("kept", "note");
        entity.add_observation_with_source("fact", "docs");
        let snapshot = entity.clone();

        entity.populate_defaults();

        assert_eq!(entity, snapshot);
    }

    #[test]
    fn test_populate_defaults_keeps_pre_epoch_timestamps() {
        let json = r#"{
            "name": "apollo",
            "entityType": "event",
            "observations": [
                {"id": "a", "text": "landing", "createdAt": "1969-07-20T20:17:00Z", "source": "nasa"},
                {"id": "b", "text": "zero time", "createdAt": "0001-01-01T00:00:00Z", "source": "nasa"}
            ],
            "createdAt": "1969-07-20T20:17:00Z",
            "lastModified": "1970-01-01T00:00:00Z"
        }"#;
        let mut entity = Entity::from_json(json.as_bytes()).unwrap();
        let landing = entity.created_at;

        entity.populate_defaults();

        assert_eq!(entity.created_at, landing);
        assert_eq!(entity.observations[0].created_at, landing);
        assert!(!is_unset(&entity.last_modified));
        assert!(entity.last_modified > landing);
        assert!(!is_unset(&entity.observations[1].created_at));
        assert!(entity.observations[1].created_at > landing);
    }

    #[test]
    fn test_validate_populates_then_checks() {
        let validator = Validator::default();

        let mut entity = Entity::new("project_standards", "guideline");
        entity.observations.push(Observation {
            id: String::new(),
            text: "filled in by validate".into(),
            created_at: DateTime::default(),
            source: String::new(),
        });
        assert!(entity.validate(&validator).is_ok());
        assert!(!entity.observations[0].id.is_empty());

        let mut invalid = Entity::new("", "guideline");
        assert!(invalid.validate(&validator).is_err());
    }

    #[test]
    fn test_json_field_names() {
        let mut entity = Entity::new("project_standards", "guideline");
        entity.add_observation("use conventional commits");

        let value: serde_json::Value = serde_json::from_slice(&entity.to_json().unwrap()).unwrap();
        assert!(value.get("entityType").is_some());
        assert!(value.get("lastModified").is_some());
        assert!(value["observations"][0].get("createdAt").is_some());

        let decoded = Entity::from_json(&entity.to_json().unwrap()).unwrap();
        assert_eq!(decoded, entity);
    }

    #[test]
    fn test_null_observations_decode_as_empty() {
        let json = r#"{"name":"n","entityType":"t","observations":null,
            "createdAt":"2024-01-01T00:00:00Z","lastModified":"2024-01-01T00:00:00Z"}"#;
        let entity = Entity::from_json(json.as_bytes()).unwrap();
        assert!(entity.observations.is_empty());
    }
}
