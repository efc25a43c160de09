//! On-disk directory layout
//!
//! ```text
//! <base>/entities/<name>.json
//! <base>/relations/relations.json
//! ```

use std::path::{Path, PathBuf};

const ENTITIES_DIR: &str = "entities";
const RELATIONS_DIR: &str = "relations";
const RELATIONS_FILE: &str = "relations.json";
const ENTITY_EXT: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    base_dir: PathBuf,
    entities_dir: PathBuf,
    relations_file: PathBuf,
}

impl StoreLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let entities_dir = base_dir.join(ENTITIES_DIR);
        let relations_file = base_dir.join(RELATIONS_DIR).join(RELATIONS_FILE);
        Self {
            base_dir,
            entities_dir,
            relations_file,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn entities_dir(&self) -> &Path {
        &self.entities_dir
    }

    pub fn relations_dir(&self) -> &Path {
        // relations_file is always <base>/relations/relations.json
        self.relations_file.parent().unwrap_or(&self.base_dir)
    }

    pub fn relations_file(&self) -> &Path {
        &self.relations_file
    }

    /// The name is used verbatim as the file stem; callers check it first
    pub fn entity_path(&self, name: &str) -> PathBuf {
        self.entities_dir.join(format!("{}{}", name, ENTITY_EXT))
    }

    /// Entity name for a directory entry, or None if it is not an entity file
    pub fn entity_name(file_name: &str) -> Option<&str> {
        file_name
            .strip_suffix(ENTITY_EXT)
            .filter(|stem| !stem.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = StoreLayout::new("/data");
        assert_eq!(layout.entities_dir(), Path::new("/data/entities"));
        assert_eq!(
            layout.relations_file(),
            Path::new("/data/relations/relations.json")
        );
        assert_eq!(layout.relations_dir(), Path::new("/data/relations"));
        assert_eq!(
            layout.entity_path("project_standards"),
            Path::new("/data/entities/project_standards.json")
        );
    }

    #[test]
    fn test_entity_name() {
        assert_eq!(StoreLayout::entity_name("a.json"), Some("a"));
        assert_eq!(StoreLayout::entity_name("v1.2.json"), Some("v1.2"));
        assert_eq!(StoreLayout::entity_name(".json"), None);
        assert_eq!(StoreLayout::entity_name(".tmpAbC123"), None);
        assert_eq!(StoreLayout::entity_name("notes.txt"), None);
    }
}
