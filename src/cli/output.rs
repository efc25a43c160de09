//! Output handlers for CLI commands
//!
//! Supports console (pretty) and JSON output modes.

use crate::memory::{format_entity, format_entity_listing, format_remembered, format_search_results};
use crate::model::{Entity, Observation, Relation};
use crate::store::SearchResult;
use serde::Serialize;
use std::fmt::Write as _;

/// Output mode for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Console,
    Json,
}

/// Results and failures produced by commands
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Initialized {
        data_dir: String,
    },
    Remembered {
        entity: String,
        created: bool,
        observation: Observation,
    },
    Entity {
        entity: Entity,
    },
    Entities {
        entity_type: Option<String>,
        entities: Vec<Entity>,
    },
    SearchResults {
        query: String,
        results: Vec<SearchResult>,
    },
    Forgotten {
        entity: String,
    },
    Related {
        relation: Relation,
    },
    Unrelated {
        id: String,
    },
    Relations {
        relations: Vec<Relation>,
    },
    Pruned {
        removed: usize,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

impl OutputEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, OutputEvent::Error { .. })
    }
}

/// Output handler trait
pub trait OutputHandler: Send + Sync {
    /// Emit an event
    fn emit(&self, event: OutputEvent);
}

/// Human-readable output; errors go to stderr
pub struct ConsoleHandler;

impl ConsoleHandler {
    pub fn new() -> Self {
        Self
    }

    fn render(event: &OutputEvent) -> String {
        match event {
            OutputEvent::Initialized { data_dir } => {
                format!("✓ Memory store ready at {}\n", data_dir)
            }
            OutputEvent::Remembered {
                observation,
                created,
                entity,
            } => {
                let mut text = format_remembered(&observation.text);
                if *created {
                    let _ = write!(text, " (new entity '{}')", entity);
                }
                text.push('\n');
                text
            }
            OutputEvent::Entity { entity } => format_entity(entity),
            OutputEvent::Entities {
                entity_type,
                entities,
            } => format_entity_listing(entity_type.as_deref(), entities),
            OutputEvent::SearchResults { query, results } => format_search_results(query, results),
            OutputEvent::Forgotten { entity } => format!("✓ Forgot: {}\n", entity),
            OutputEvent::Related { relation } => format!(
                "✓ Related: {} -[{}]-> {} ({})\n",
                relation.from, relation.relation_type, relation.to, relation.id
            ),
            OutputEvent::Unrelated { id } => format!("✓ Removed relation {}\n", id),
            OutputEvent::Relations { relations } => {
                if relations.is_empty() {
                    return "No relations found.\n".to_string();
                }
                let mut text = String::new();
                for relation in relations {
                    let _ = writeln!(
                        text,
                        "{} -[{}]-> {} ({})",
                        relation.from, relation.relation_type, relation.to, relation.id
                    );
                }
                text
            }
            OutputEvent::Pruned { removed } => format!("✓ Pruned {} dangling relation(s)\n", removed),
            OutputEvent::Error { message, .. } => format!("Error: {}\n", message),
        }
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler for ConsoleHandler {
    fn emit(&self, event: OutputEvent) {
        let text = Self::render(&event);
        if event.is_error() {
            eprint!("{}", text);
        } else {
            print!("{}", text);
        }
    }
}

/// JSON output handler; one document per event on stdout
pub struct JsonHandler;

impl JsonHandler {
    fn render(event: &OutputEvent) -> serde_json::Result<String> {
        serde_json::to_string(event)
    }
}

impl OutputHandler for JsonHandler {
    fn emit(&self, event: OutputEvent) {
        match Self::render(&event) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::error!(error = %e, "Failed to serialize output event"),
        }
    }
}

/// Create an output handler based on mode
pub fn create_handler(mode: OutputMode) -> Box<dyn OutputHandler> {
    match mode {
        OutputMode::Console => Box::new(ConsoleHandler::new()),
        OutputMode::Json => Box::new(JsonHandler),
    }
}
