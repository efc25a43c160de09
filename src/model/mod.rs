//! Entity/relation value types
//!
//! Pure in-memory model: construction, mutation, default population,
//! validation and search helpers. Nothing here touches the filesystem.

mod entity;
mod relation;
mod validation;

pub use entity::{DEFAULT_SOURCE, Entity, Observation};
pub use relation::{Relation, RelationSet};
pub use validation::{Limits, ValidationError, Validator};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// `0001-01-01T00:00:00Z`, the zero time some older writers emitted
const ZERO_TIME_SECS: i64 = -62_135_596_800;

/// A timestamp is unset only when it is exactly the Unix epoch (the decoded
/// default) or the zero time; any other instant, pre-1970 included, is kept
pub(crate) fn is_unset(ts: &DateTime<Utc>) -> bool {
    ts.timestamp_subsec_nanos() == 0 && matches!(ts.timestamp(), 0 | ZERO_TIME_SECS)
}

/// Older writers serialized empty sequences as `null`
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
