//! Field validation for entities, observations and relations
//!
//! `Validator` only checks; it never mutates. Default population lives on the
//! model types (`populate_defaults`) so the two steps can be exercised apart.

use super::{Entity, Observation, Relation};
use thiserror::Error;
use uuid::Uuid;

/// A field failed a required/length/format check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} is {actual} characters, maximum is {max}")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be a UUID, got '{value}'")]
    InvalidId { field: String, value: String },

    #[error("invalid entity name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// Most filesystems cap a file name at 255 bytes; the stem leaves room for `.json`
pub const MAX_NAME_BYTES: usize = 255 - ".json".len();

/// Maximum lengths, counted in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub name: usize,
    pub entity_type: usize,
    pub observation_text: usize,
    pub source: usize,
    pub relation_endpoint: usize,
    pub relation_type: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            name: 200,
            entity_type: 100,
            observation_text: 1000,
            source: 100,
            relation_endpoint: 200,
            relation_type: 100,
        }
    }
}

/// Stateless validation service, built once and handed to whoever needs it
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: Limits,
}

impl Validator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Check the entity and every observation it holds
    pub fn validate_entity(&self, entity: &Entity) -> Result<(), ValidationError> {
        self.validate_name(&entity.name)?;
        check_text("entityType", &entity.entity_type, self.limits.entity_type)?;
        for (index, observation) in entity.observations.iter().enumerate() {
            self.validate_observation(index, observation)?;
        }
        Ok(())
    }

    pub fn validate_observation(
        &self,
        index: usize,
        observation: &Observation,
    ) -> Result<(), ValidationError> {
        let field = |name: &str| format!("observations[{}].{}", index, name);

        check_uuid(&field("id"), &observation.id)?;
        check_text(&field("text"), &observation.text, self.limits.observation_text)?;
        check_text(&field("source"), &observation.source, self.limits.source)?;
        Ok(())
    }

    pub fn validate_relation(&self, relation: &Relation) -> Result<(), ValidationError> {
        check_uuid("id", &relation.id)?;
        check_text("from", &relation.from, self.limits.relation_endpoint)?;
        check_text("to", &relation.to, self.limits.relation_endpoint)?;
        check_text(
            "relationType",
            &relation.relation_type,
            self.limits.relation_type,
        )?;
        Ok(())
    }

    /// Entity names double as file stems, so they must be safe path components
    pub fn validate_name(&self, name: &str) -> Result<(), ValidationError> {
        check_text("name", name, self.limits.name)?;

        let reason = if name == "." || name == ".." {
            Some("reserved path component")
        } else if name.contains('/') || name.contains('\\') {
            Some("contains a path separator")
        } else if name.chars().any(char::is_control) {
            Some("contains a control character")
        } else if name.len() > MAX_NAME_BYTES {
            Some("too long for a file name")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ValidationError::InvalidName {
                name: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

fn check_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

fn check_uuid(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidId {
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_entity_passes() {
        let validator = Validator::default();
        let mut entity = Entity::new("project_standards", "guideline");
        entity.add_observation("use conventional commits");

        assert!(validator.validate_entity(&entity).is_ok());
    }

    #[test]
    fn test_required_fields() {
        let validator = Validator::default();

        let err = validator
            .validate_entity(&Entity::new("", "guideline"))
            .unwrap_err();
        assert_eq!(err, ValidationError::Required { field: "name".into() });

        let err = validator.validate_entity(&Entity::new("x", "")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Required {
                field: "entityType".into()
            }
        );
    }

    #[test]
    fn test_length_bounds_count_characters() {
        let validator = Validator::default();

        let ok = "é".repeat(125);
        assert!(validator.validate_name(&ok).is_ok());

        // 200 characters but 400 bytes
        let wide = "é".repeat(200);
        assert!(matches!(
            validator.validate_name(&wide),
            Err(ValidationError::InvalidName { .. })
        ));
        assert!(validator.validate_name(&"a".repeat(200)).is_ok());

        let too_long = "a".repeat(201);
        assert!(matches!(
            validator.validate_name(&too_long),
            Err(ValidationError::TooLong { max: 200, actual: 201, .. })
        ));

        let mut entity = Entity::new("n", "t");
        entity.add_observation("x".repeat(1001));
        let err = validator.validate_entity(&entity).unwrap_err();
        assert!(err.to_string().contains("observations[0].text"));
    }

    #[test]
    fn test_observation_id_must_be_uuid() {
        let validator = Validator::default();
        let mut entity = Entity::new("n", "t");
        entity.add_observation("fact");
        entity.observations[0].id = "not-a-uuid".into();

        assert!(matches!(
            validator.validate_entity(&entity),
            Err(ValidationError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_name_policy() {
        let validator = Validator::default();

        for bad in [".", "..", "../etc/passwd", "a/b", "a\\b", "nul\0byte", "tab\there"] {
            assert!(
                matches!(
                    validator.validate_name(bad),
                    Err(ValidationError::InvalidName { .. })
                ),
                "expected {:?} to be rejected",
                bad
            );
        }

        for good in ["project_standards", "api patterns", "v1.2", ".hidden", "日本語"] {
            assert!(validator.validate_name(good).is_ok(), "{:?}", good);
        }
    }

    #[test]
    fn test_relation_validation() {
        let validator = Validator::default();
        assert!(
            validator
                .validate_relation(&Relation::new("a", "b", "uses"))
                .is_ok()
        );

        let mut missing = Relation::new("a", "", "uses");
        assert!(validator.validate_relation(&missing).is_err());

        missing.to = "b".into();
        missing.id = String::new();
        assert_eq!(
            validator.validate_relation(&missing).unwrap_err(),
            ValidationError::Required { field: "id".into() }
        );
    }

    #[test]
    fn test_custom_limits() {
        let validator = Validator::new(Limits {
            name: 3,
            ..Limits::default()
        });
        assert!(validator.validate_name("abc").is_ok());
        assert!(validator.validate_name("abcd").is_err());
    }
}
