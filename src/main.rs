//! # River Nexus CLI (`nexus`)
//!
//! The `nexus` binary browses the tool directory, runs smart search, talks
//! to the River Core assistant, manages favorites and usage, and starts the
//! HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! nexus --config ./config/nexus.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nexus tools` | List the catalog, grouped by category |
//! | `nexus search "<query>"` | Resolve one query (remote first, local fallback) |
//! | `nexus watch` | Debounced search over query edits read from stdin |
//! | `nexus chat [message]` | Ask River Core once, or chat interactively |
//! | `nexus fav <id>` | Toggle a favorite |
//! | `nexus use <id>` | Record that a tool was opened and print its URL |
//! | `nexus prefs` | Show favorites and recently used tools |
//! | `nexus hot` | Most-clicked tools |
//! | `nexus serve` | Start the JSON HTTP server |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`);
//! usage events use the `analytics` target.

use clap::{Parser, Subcommand};
use nexus_core::models::CategoryFilter;
use nexus_core::prefs::DEFAULT_HOT_LIMIT;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use river_nexus::app::App;
use river_nexus::{chat, config, search, server, tools};

/// River Nexus CLI: a curated tool directory with smart search.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/nexus.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "nexus",
    about = "River Nexus: a curated tool directory with LLM-assisted smart search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/nexus.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog tools, grouped by category.
    Tools {
        /// Category slug or label (`ai`, `开发`, ...); defaults to all.
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Print JSON instead of the grouped listing.
        #[arg(long)]
        json: bool,
    },

    /// Resolve one query.
    ///
    /// Queries of at least `[search].remote_min_chars` characters are sent
    /// to the configured language model first; short queries, empty answers
    /// and failures use local substring matching.
    Search {
        query: String,

        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        #[arg(long)]
        json: bool,
    },

    /// Debounced search over stdin.
    ///
    /// Every line replaces the query text; `:cat <slug>` switches category
    /// and `:reset` clears both. A view is printed whenever a result settles.
    Watch {
        #[arg(long)]
        json: bool,
    },

    /// Talk to River Core.
    ///
    /// With a message, prints one reply. Without, starts an interactive
    /// session; `/exit` or end of input leaves.
    Chat { message: Option<String> },

    /// Toggle a tool as favorite.
    Fav { id: String },

    /// Record that a tool was opened and print its URL.
    Use { id: String },

    /// Show favorites and recently used tools.
    Prefs {
        #[arg(long)]
        json: bool,
    },

    /// Show the most-clicked tools.
    Hot {
        #[arg(long, default_value_t = DEFAULT_HOT_LIMIT)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => server::run_server(cfg).await,
        command => run_command(&App::from_config(cfg)?, command).await,
    }
}

async fn run_command(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Tools { category, json } => tools::run_tools(app, category, json),
        Commands::Search {
            query,
            category,
            json,
        } => search::run_search(app, &query, category, json).await,
        Commands::Watch { json } => search::run_watch(app, json).await,
        Commands::Chat { message } => chat::run_chat(app, message).await,
        Commands::Fav { id } => tools::run_fav(app, &id),
        Commands::Use { id } => tools::run_use(app, &id),
        Commands::Prefs { json } => tools::run_prefs(app, json),
        Commands::Hot { limit, json } => tools::run_hot(app, limit, json),
        Commands::Serve => server::run_server(app.config.clone()).await,
    }
}
