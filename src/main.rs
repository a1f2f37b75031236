//! # Document Duplicator CLI (`ddup`)
//!
//! The `ddup` binary is the host surface for the selection pipeline. It
//! provides commands for schema inspection, document selection, duplication
//! handoff, and the long-lived session server.
//!
//! ## Usage
//!
//! ```bash
//! ddup --config ./config/ddup.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ddup types` | List the document types registered in the schema manifest |
//! | `ddup select` | Resolve a query or type pick into a working set |
//! | `ddup duplicate` | Select, then forward the working set to the duplication engine |
//! | `ddup serve` | Start the session HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # List registered document types
//! ddup types --config ./config/ddup.toml
//!
//! # Free-form query
//! ddup select --query '*[_type == "article"]' --config ./config/ddup.toml
//!
//! # Pick a type by its display title
//! ddup select --type "Article" --config ./config/ddup.toml
//!
//! # Select and hand off to the duplication engine
//! ddup duplicate --type "Article" --config ./config/ddup.toml
//!
//! # Start the session server
//! ddup serve --config ./config/ddup.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use doc_duplicator::{config, duplicate, schema, select, server};

/// Document Duplicator CLI — select documents from a content store and hand
/// them to a duplication engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ddup.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ddup",
    about = "Document Duplicator — select documents from a content store by query or schema type",
    version,
    long_about = "Document Duplicator resolves a free-form query or a schema-type pick against a \
    content store, filters the results down to schema-registered, published documents, and hands \
    the surviving working set to an external duplication engine."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ddup.toml`. Store endpoint, schema manifest,
    /// duplication, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/ddup.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List the document types registered in the schema manifest.
    ///
    /// Shows each type's stable internal name and operator-facing title.
    /// Titles are not unique; when two types share one, `--type` picks
    /// whichever is declared first.
    Types,

    /// Resolve a selection and print the working set.
    ///
    /// Runs the query (or the query equivalent of a type pick) against the
    /// content store, drops documents that are not registered to the schema
    /// or that are drafts, and prints what survives.
    Select {
        /// Free-form query in the store's query language, passed verbatim.
        /// Must resolve to an array of objects.
        #[arg(long, conflicts_with = "type_title")]
        query: Option<String>,

        /// Display title of a document type from the schema manifest.
        #[arg(long = "type", conflicts_with = "query")]
        type_title: Option<String>,
    },

    /// Select documents, then forward them to the duplication engine.
    ///
    /// Requires `duplication.engine_url` in the config and a capability
    /// token in the env var named by `store.token_env`. An empty selection
    /// forwards nothing.
    Duplicate {
        /// Free-form query in the store's query language, passed verbatim.
        #[arg(long, conflicts_with = "type_title")]
        query: Option<String>,

        /// Display title of a document type from the schema manifest.
        #[arg(long = "type", conflicts_with = "query")]
        type_title: Option<String>,
    },

    /// Start the session HTTP server.
    ///
    /// Hosts a long-lived selection session behind a JSON API, bound to
    /// the address in `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Types => {
            schema::run_types(&cfg)?;
        }
        Commands::Select { query, type_title } => {
            select::run_select(&cfg, query, type_title).await?;
        }
        Commands::Duplicate { query, type_title } => {
            duplicate::run_duplicate(&cfg, query, type_title).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
