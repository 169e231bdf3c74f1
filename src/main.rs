//! # FindItNow CLI (`findit`)
//!
//! The `findit` binary manages the lost-and-found item registry and runs
//! the lost/found matcher against it.
//!
//! ## Usage
//!
//! ```bash
//! findit --config ./config/finditnow.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `findit init` | Create the SQLite database and item schema |
//! | `findit import <file>` | Load a JSON array of items |
//! | `findit list` | List items, optionally by kind or category |
//! | `findit get <id>` | Show one item |
//! | `findit create <file>` | Report a new item and print its potential matches |
//! | `findit delete <id>` | Remove an item |
//! | `findit match <id>` | Rank potential matches for an item |
//! | `findit serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use finditnow::{config, items, matches, migrate, server};
use finditnow_core::models::Classification;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// FindItNow CLI: a campus lost-and-found registry with lost/found
/// item matching.
#[derive(Parser)]
#[command(
    name = "findit",
    about = "FindItNow: a campus lost-and-found registry with item matching",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/finditnow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Import items from a JSON array file.
    ///
    /// Records may use `kind` or the legacy `status` field.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// List items.
    List {
        /// Only items of this kind: `lost`, `found`, or `recovered`.
        #[arg(long)]
        kind: Option<Classification>,

        /// Only items in this category (exact match).
        #[arg(long)]
        category: Option<String>,
    },

    /// Show an item by id.
    Get {
        /// Item id.
        id: String,
    },

    /// Report a new item from a JSON file and print its potential matches.
    Create {
        /// Path to a JSON object with the item fields.
        file: PathBuf,
    },

    /// Update an item from a JSON file of changed fields.
    ///
    /// Absent fields keep their stored value. Setting `kind` (or `status`)
    /// to `recovered` takes the item out of matching.
    Update {
        /// Item id.
        id: String,

        /// Path to a JSON object with the fields to change.
        file: PathBuf,
    },

    /// Delete an item by id.
    Delete {
        /// Item id.
        id: String,
    },

    /// Rank potential matches for an item.
    ///
    /// Candidates must be of the opposite kind and the same category;
    /// at most five are shown, best first.
    Match {
        /// Item id.
        id: String,

        /// Show the per-signal score breakdown.
        #[arg(long)]
        explain: bool,

        /// Print the results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing(cfg: &config::Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            items::run_import(&cfg, &file).await?;
        }
        Commands::List { kind, category } => {
            items::run_list(&cfg, kind, category).await?;
        }
        Commands::Get { id } => {
            items::run_get(&cfg, &id).await?;
        }
        Commands::Create { file } => {
            items::run_create(&cfg, &file).await?;
        }
        Commands::Update { id, file } => {
            items::run_update(&cfg, &id, &file).await?;
        }
        Commands::Delete { id } => {
            items::run_delete(&cfg, &id).await?;
        }
        Commands::Match { id, explain, json } => {
            matches::run_match(&cfg, &id, explain, json).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
