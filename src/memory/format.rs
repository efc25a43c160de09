//! Plain-text renderings used by tool-style output

use crate::model::Entity;
use crate::store::SearchResult;
use std::fmt::Write;

pub fn format_entity(entity: &Entity) -> String {
    let mut text = format!(
        "Entity: {} ({})\nObservations:\n",
        entity.name, entity.entity_type
    );
    for (i, observation) in entity.observations.iter().enumerate() {
        let _ = writeln!(text, "{}. {}", i + 1, observation.text);
    }
    text
}

/// Listing header depends on whether a type filter was applied
pub fn format_entity_listing(entity_type: Option<&str>, entities: &[Entity]) -> String {
    let mut text = match entity_type.filter(|t| !t.is_empty()) {
        Some(entity_type) => format!("Entities of type '{}':\n", entity_type),
        None => "All entities:\n".to_string(),
    };
    for entity in entities {
        let _ = writeln!(
            text,
            "- {} ({}): {} observations",
            entity.name,
            entity.entity_type,
            entity.observation_count()
        );
    }
    text
}

pub fn format_search_results(query: &str, results: &[SearchResult]) -> String {
    let mut text = format!("Search results for '{}':\n", query);
    if results.is_empty() {
        text.push_str("No results found.\n");
        return text;
    }
    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. [{}] {}: {}",
            i + 1,
            result.entity_type,
            result.entity_name,
            result.observation.text
        );
    }
    text
}

pub fn format_remembered(observation: &str) -> String {
    format!("✓ Remembered: {}", observation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    #[test]
    fn test_format_entity() {
        let mut entity = Entity::new("project_standards", "guideline");
        entity.add_observation("use conventional commits");
        entity.add_observation("squash before merge");

        assert_eq!(
            format_entity(&entity),
            "Entity: project_standards (guideline)\nObservations:\n\
             1. use conventional commits\n2. squash before merge\n"
        );
    }

    #[test]
    fn test_format_listing() {
        let mut a = Entity::new("a", "guideline");
        a.add_observation("x");
        let b = Entity::new("b", "guideline");

        assert_eq!(
            format_entity_listing(Some("guideline"), &[a.clone(), b.clone()]),
            "Entities of type 'guideline':\n- a (guideline): 1 observations\n- b (guideline): 0 observations\n"
        );
        assert_eq!(format_entity_listing(Some(""), &[]), "All entities:\n");
        assert_eq!(format_entity_listing(None, &[]), "All entities:\n");
    }

    #[test]
    fn test_format_search_results() {
        assert_eq!(
            format_search_results("nothing", &[]),
            "Search results for 'nothing':\nNo results found.\n"
        );

        let results = vec![SearchResult {
            entity_name: "project_standards".into(),
            entity_type: "guideline".into(),
            observation: Observation::new("use conventional commits"),
        }];
        assert_eq!(
            format_search_results("commit", &results),
            "Search results for 'commit':\n1. [guideline] project_standards: use conventional commits\n"
        );
    }

    #[test]
    fn test_format_remembered() {
        assert_eq!(format_remembered("fact"), "✓ Remembered: fact");
    }
}
