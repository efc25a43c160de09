//! Memory operations layered over a `MemoryStore`

mod format;
mod service;

pub use format::{format_entity, format_entity_listing, format_remembered, format_search_results};
pub use service::{
    DEFAULT_ENTITY_TYPE, EntityRevision, MemoryService, Recall, RecallQuery, RelationFilter,
    RelationPatch, RememberRequest, Remembered,
};
