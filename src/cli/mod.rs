//! CLI module for memctx
//!
//! This module provides:
//! - Command implementations (remember, recall, relate, etc.)
//! - Output handlers (console, JSON)
//!
//! # Example
//!
//! ```ignore
//! use memory_context::cli::{commands, output};
//!
//! let handler = output::create_handler(output::OutputMode::Console);
//! let (service, data_dir) = commands::open_service(&config)?;
//! let exit_code = commands::forget(&service, "old_notes", &*handler);
//! ```

pub mod commands;
pub mod output;

pub use output::{OutputEvent, OutputHandler, OutputMode, create_handler};
