//! Configuration types and loading for memory-context

mod error;
mod loader;
mod sections;

pub use error::ConfigError;
pub use loader::{MemoryConfig, default_data_dir};
pub use sections::{LogLevel, LoggingConfig, SearchConfig, StorageConfig};
