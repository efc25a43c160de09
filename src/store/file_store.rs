//! File-backed `MemoryStore`
//!
//! Lock order is always file lock, then cache lock. Cache fills after a miss
//! happen under the path's read lock and cache updates after a write happen
//! under its write lock, so the cache never holds a value older than the file.

use super::MemoryStore;
use super::cache::StoreCache;
use super::error::{Resource, StoreError, StoreResult};
use super::layout::StoreLayout;
use super::locks::{self, LockRegistry};
use crate::model::{Entity, RelationSet, Validator};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Tunables for `FileStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStoreOptions {
    /// Write to a temp file in the same directory and rename it over the target
    pub atomic_writes: bool,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            atomic_writes: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Target must not exist yet
    Create,
    /// Target must already exist
    Replace,
    /// Write regardless
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Written,
    AlreadyPresent,
    Missing,
}

/// Entity and relation storage rooted at a base directory
#[derive(Debug)]
pub struct FileStore {
    layout: StoreLayout,
    validator: Validator,
    options: FileStoreOptions,
    cache: StoreCache,
    locks: LockRegistry,
}

impl FileStore {
    /// Store with default validation limits and atomic writes
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_options(base_dir, Validator::default(), FileStoreOptions::default())
    }

    pub fn with_options(
        base_dir: impl Into<PathBuf>,
        validator: Validator,
        options: FileStoreOptions,
    ) -> Self {
        Self {
            layout: StoreLayout::new(base_dir),
            validator,
            options,
            cache: StoreCache::new(),
            locks: LockRegistry::new(),
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn options(&self) -> FileStoreOptions {
        self.options
    }

    pub fn cached_entity_count(&self) -> usize {
        self.cache.entity_count()
    }

    fn entity_path(&self, name: &str) -> StoreResult<PathBuf> {
        self.validator.validate_name(name)?;
        Ok(self.layout.entity_path(name))
    }

    fn load_entity(&self, name: &str, path: &Path) -> StoreResult<Entity> {
        let lock = self.locks.lock_for(path);
        let _guard = locks::read(&lock);

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::entity_not_found(name));
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let entity = Entity::from_json(&data).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded entity from disk");
        self.cache.put_entity(name, entity.clone());
        Ok(entity)
    }

    fn write_entity(&self, entity: &Entity, mode: WriteMode) -> StoreResult<()> {
        let path = self.layout.entity_path(&entity.name);
        let data = entity.to_json().map_err(|source| StoreError::Encode {
            resource: Resource::Entity,
            source,
        })?;

        let lock = self.locks.lock_for(&path);
        let _guard = locks::write(&lock);

        match self.write_checked(&path, &data, mode) {
            Ok(WriteOutcome::Written) => {}
            Ok(WriteOutcome::AlreadyPresent) => return Err(StoreError::entity_exists(&entity.name)),
            Ok(WriteOutcome::Missing) => return Err(StoreError::entity_not_found(&entity.name)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write entity file");
                return Err(StoreError::io(&path, e));
            }
        }

        tracing::debug!(path = %path.display(), bytes = data.len(), "Wrote entity file");
        self.cache.put_entity(&entity.name, entity.clone());
        Ok(())
    }

    fn load_relations(&self) -> StoreResult<RelationSet> {
        let path = self.layout.relations_file();
        let lock = self.locks.lock_for(path);
        let _guard = locks::read(&lock);

        let relations = match fs::read(path) {
            Ok(data) => RelationSet::from_json(&data).map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => RelationSet::new(),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        tracing::debug!(
            path = %path.display(),
            count = relations.len(),
            "Loaded relations from disk"
        );
        self.cache.put_relations(relations.clone());
        Ok(relations)
    }

    /// Caller must hold the write lock for `path`
    fn write_checked(&self, path: &Path, data: &[u8], mode: WriteMode) -> io::Result<WriteOutcome> {
        match mode {
            WriteMode::Create => {
                if path.try_exists()? {
                    return Ok(WriteOutcome::AlreadyPresent);
                }
            }
            WriteMode::Replace => {
                if !path.try_exists()? {
                    return Ok(WriteOutcome::Missing);
                }
            }
            WriteMode::Overwrite => {}
        }

        let exclusive = mode == WriteMode::Create;
        let result = if self.options.atomic_writes {
            write_atomic(path, data, exclusive)
        } else {
            write_in_place(path, data, exclusive)
        };

        match result {
            Ok(()) => Ok(WriteOutcome::Written),
            // another process won the race between the check and the write
            Err(e) if exclusive && e.kind() == io::ErrorKind::AlreadyExists => {
                Ok(WriteOutcome::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }
}

impl MemoryStore for FileStore {
    fn initialize(&self) -> StoreResult<()> {
        tracing::info!(base_dir = %self.layout.base_dir().display(), "Initializing file store");

        for dir in [self.layout.entities_dir(), self.layout.relations_dir()] {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }

        let path = self.layout.relations_file();
        let data = RelationSet::new()
            .to_json()
            .map_err(|source| StoreError::Encode {
                resource: Resource::Relation,
                source,
            })?;

        let lock = self.locks.lock_for(path);
        let _guard = locks::write(&lock);
        let outcome = self
            .write_checked(path, &data, WriteMode::Create)
            .map_err(|e| StoreError::io(path, e))?;
        if outcome == WriteOutcome::Written {
            tracing::debug!(path = %path.display(), "Created empty relations file");
        }

        Ok(())
    }

    fn create_entity(&self, mut entity: Entity) -> StoreResult<Entity> {
        entity.validate(&self.validator)?;
        self.write_entity(&entity, WriteMode::Create)?;
        Ok(entity)
    }

    fn get_entity(&self, name: &str) -> StoreResult<Entity> {
        let path = self.entity_path(name)?;

        if let Some(entity) = self.cache.entity(name) {
            return Ok(entity);
        }

        self.load_entity(name, &path)
    }

    fn update_entity(&self, mut entity: Entity) -> StoreResult<Entity> {
        entity.validate(&self.validator)?;
        self.write_entity(&entity, WriteMode::Replace)?;
        Ok(entity)
    }

    fn delete_entity(&self, name: &str) -> StoreResult<()> {
        let path = self.entity_path(name)?;
        let lock = self.locks.lock_for(&path);
        let _guard = locks::write(&lock);

        match fs::remove_file(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Deleted entity file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&path, e)),
        }

        self.cache.evict_entity(name);
        Ok(())
    }

    fn list_entities(&self, entity_type: Option<&str>) -> StoreResult<Vec<Entity>> {
        let dir = self.layout.entities_dir();
        let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut file_names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            // non-UTF-8 names can never have been written by this store
            if let Ok(file_name) = entry.file_name().into_string() {
                file_names.push(file_name);
            }
        }
        file_names.sort();

        let mut entities = Vec::new();
        for file_name in &file_names {
            let Some(name) = StoreLayout::entity_name(file_name) else {
                continue;
            };

            match self.get_entity(name) {
                Ok(entity) => {
                    if entity.matches_type(entity_type) {
                        entities.push(entity);
                    }
                }
                Err(e) => {
                    tracing::warn!(entity = %name, error = %e, "Skipping unreadable entity file");
                }
            }
        }

        Ok(entities)
    }

    fn entity_exists(&self, name: &str) -> bool {
        let Ok(path) = self.entity_path(name) else {
            return false;
        };

        match fs::metadata(&path) {
            Ok(_) => true,
            Err(e) => e.kind() != io::ErrorKind::NotFound,
        }
    }

    fn get_relations(&self) -> StoreResult<RelationSet> {
        if let Some(relations) = self.cache.relations() {
            return Ok(relations);
        }

        self.load_relations()
    }

    fn save_relations(&self, mut relations: RelationSet) -> StoreResult<RelationSet> {
        relations.populate_defaults();
        for relation in &relations.relations {
            self.validator.validate_relation(relation)?;
        }

        let path = self.layout.relations_file();
        let data = relations.to_json().map_err(|source| StoreError::Encode {
            resource: Resource::Relation,
            source,
        })?;

        let lock = self.locks.lock_for(path);
        let _guard = locks::write(&lock);

        self.write_checked(path, &data, WriteMode::Overwrite)
            .map_err(|e| StoreError::io(path, e))?;

        tracing::debug!(
            path = %path.display(),
            count = relations.len(),
            "Wrote relations file"
        );
        self.cache.put_relations(relations.clone());
        Ok(relations)
    }

    fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Cleared store cache");
    }

    fn ping(&self) -> StoreResult<()> {
        let base = self.layout.base_dir();
        fs::metadata(base)
            .map(|_| ())
            .map_err(|e| StoreError::io(base, e))
    }
}

/// Write to a sibling temp file, fsync, then rename over `path`
fn write_atomic(path: &Path, data: &[u8], exclusive: bool) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target has no parent directory")
    })?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.as_file().sync_all()?;

    if exclusive {
        tmp.persist_noclobber(path)?;
    } else {
        tmp.persist(path)?;
    }
    Ok(())
}

/// Truncate-and-write; a crash mid-write can leave a partial file
fn write_in_place(path: &Path, data: &[u8], exclusive: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if exclusive {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }

    let mut file = options.open(path)?;
    file.write_all(data)
}
