use anyhow::Result;
use clap::{Parser, Subcommand};
use memory_context::cli::{OutputMode, commands, create_handler};
use memory_context::config::MemoryConfig;
use memory_context::logging;
use memory_context::memory::{RecallQuery, RelationFilter, RememberRequest};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "memctx")]
#[command(about = "File-backed memory of entities, observations and relations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Extra config file, applied after user and project config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project directory used to find .memory-context/config.toml
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Only log errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the storage layout
    Init,

    /// Add an observation, creating the entity if needed
    Remember {
        entity: String,
        observation: String,

        /// Entity type used when the entity is new
        #[arg(long = "type")]
        entity_type: Option<String>,

        /// Where the observation came from
        #[arg(long)]
        source: Option<String>,
    },

    /// Show one entity, search, or list
    Recall {
        #[arg(long)]
        entity: Option<String>,

        #[arg(long = "type")]
        entity_type: Option<String>,

        #[arg(long)]
        query: Option<String>,
    },

    /// Case-insensitive search over observations
    Search {
        query: String,

        #[arg(long = "type")]
        entity_type: Option<String>,

        /// Maximum results (0 for unlimited)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete an entity
    Forget { entity: String },

    /// Link two entities
    Relate {
        from: String,
        to: String,
        relation_type: String,
    },

    /// Delete a relation by id
    Unrelate { id: String },

    /// List relations
    Relations {
        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long = "type")]
        relation_type: Option<String>,
    },

    /// List entities
    Entities {
        #[arg(long = "type")]
        entity_type: Option<String>,
    },

    /// Remove relations whose endpoints no longer exist
    Prune,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MemoryConfig::load(cli.project.as_deref(), cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = Some(data_dir.display().to_string());
    }

    logging::init_logging(cli.debug, cli.quiet, config.log_level(), config.log_file()?)?;

    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };
    let handler = create_handler(mode);
    let (service, data_dir) = commands::open_service(&config)?;

    let code = match cli.command {
        Commands::Init => commands::init(&service, &data_dir, &*handler),

        Commands::Remember {
            entity,
            observation,
            entity_type,
            source,
        } => commands::remember(
            &service,
            RememberRequest {
                entity_name: entity,
                entity_type,
                observation,
                source,
            },
            &*handler,
        ),

        Commands::Recall {
            entity,
            entity_type,
            query,
        } => commands::recall(
            &service,
            RecallQuery {
                entity_name: entity,
                entity_type,
                query,
            },
            &*handler,
        ),

        Commands::Search {
            query,
            entity_type,
            limit,
        } => commands::search(
            &service,
            &query,
            entity_type.as_deref(),
            limit,
            &config,
            &*handler,
        ),

        Commands::Forget { entity } => commands::forget(&service, &entity, &*handler),

        Commands::Relate {
            from,
            to,
            relation_type,
        } => commands::relate(&service, &from, &to, &relation_type, &*handler),

        Commands::Unrelate { id } => commands::unrelate(&service, &id, &*handler),

        Commands::Relations {
            from,
            to,
            relation_type,
        } => commands::relations(
            &service,
            &RelationFilter {
                from,
                to,
                relation_type,
            },
            &*handler,
        ),

        Commands::Entities { entity_type } => {
            commands::entities(&service, entity_type.as_deref(), &*handler)
        }

        Commands::Prune => commands::prune(&service, &*handler),
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
