//! File-backed knowledge memory: entities with observations, typed relations
//! between them, and substring search over everything remembered.

pub mod cli;
pub mod config;
pub mod logging;
pub mod memory;
pub mod model;
pub mod store;
