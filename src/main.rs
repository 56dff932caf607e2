//! # solr-bridge CLI
//!
//! ## Usage
//!
//! ```bash
//! solr-bridge --config ./config/solr-bridge.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `schema` | Print the Solr schema generated from the field configuration |
//! | `search "<text>"` | Search and print matching objects, total and facets |
//! | `project <class> <id>` | Show the document an object projects to |
//! | `index <class> <id>` | Index one object and commit |
//! | `delete <class> <id>` | Remove one object's document and commit |
//! | `commit` / `optimize` / `wipe` / `count` | Index control |
//! | `reindex start\|step\|run\|status\|reset` | Resumable bulk reindex |
//! | `diagnose` | Check the server, utilities, extractors and classes |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use solr_bridge::commands::index::{self, Control};
use solr_bridge::commands::reindex;
use solr_bridge::commands::schema::{self, SchemaFormat};
use solr_bridge::commands::search::{self, SearchOptions};
use solr_bridge::commands::Bridge;
use solr_bridge::config;
use solr_bridge::diagnose;
use solr_bridge::progress::ProgressMode;

/// solr-bridge: index an object store into Solr and search it.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "solr-bridge",
    about = "Index an object store into Solr and search it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/solr-bridge.toml")]
    config: PathBuf,

    /// Reindex progress on stderr. Defaults to `human` on a terminal, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated Solr schema.
    Schema {
        #[arg(long, value_enum, default_value = "xml")]
        format: SchemaFormat,
    },

    /// Search the index.
    ///
    /// Hits whose objects no longer exist are dropped; the total is the
    /// server's count.
    Search {
        /// Query text. Empty matches everything.
        text: String,

        /// Sort field (default: relevance).
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending.
        #[arg(long)]
        desc: bool,

        /// Offset of the first hit.
        #[arg(long, default_value_t = 0)]
        start: u64,

        /// Page size (default: `solr.rows`).
        #[arg(long)]
        rows: Option<u64>,

        /// Extra raw `key=value` Solr parameter. Overrides a built-in of the
        /// same name.
        #[arg(long = "param", value_parser = parse_raw_param)]
        params: Vec<String>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the document an object projects to.
    Project { class: String, id: u64 },

    /// Index one object and commit.
    Index { class: String, id: u64 },

    /// Delete one object's document and commit.
    Delete { class: String, id: u64 },

    /// Commit pending changes.
    Commit,

    /// Optimize the index.
    Optimize,

    /// Delete every document and commit.
    Wipe,

    /// Print the number of indexed documents.
    Count,

    /// Resumable bulk reindex.
    Reindex {
        #[command(subcommand)]
        action: ReindexAction,
    },

    /// Check the Solr server, extraction utilities, extractors and classes.
    Diagnose,
}

#[derive(Subcommand)]
enum ReindexAction {
    /// Wipe the index and create a new job.
    Start,
    /// Advance the job by a number of pages.
    Step {
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// Run (or resume) a job to completion.
    Run,
    /// Show the job's cursor.
    Status,
    /// Abandon the job.
    Reset,
}

/// Validate a `key=value` parameter for `--param`.
fn parse_raw_param(s: &str) -> Result<String, String> {
    match s.split_once('=') {
        Some((key, _)) if !key.is_empty() => Ok(s.to_string()),
        _ => Err(format!("invalid KEY=VALUE: no '=' found in '{}'", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    let bridge = Bridge::open(cfg)?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);
    let reporter = progress.reporter();

    match cli.command {
        Commands::Schema { format } => schema::run_schema(&bridge, format)?,
        Commands::Search {
            text,
            sort,
            desc,
            start,
            rows,
            params,
            json,
        } => {
            let options = SearchOptions {
                sort,
                desc,
                start,
                rows,
                params,
                json,
            };
            search::run_search(&bridge, &text, &options)?;
        }
        Commands::Project { class, id } => index::run_project(&bridge, &class, id)?,
        Commands::Index { class, id } => index::run_index(&bridge, &class, id)?,
        Commands::Delete { class, id } => index::run_delete(&bridge, &class, id)?,
        Commands::Commit => index::run_control(&bridge, Control::Commit)?,
        Commands::Optimize => index::run_control(&bridge, Control::Optimize)?,
        Commands::Wipe => index::run_control(&bridge, Control::Wipe)?,
        Commands::Count => index::run_control(&bridge, Control::Count)?,
        Commands::Reindex { action } => match action {
            ReindexAction::Start => reindex::run_reindex_start(&bridge, reporter.as_ref())?,
            ReindexAction::Step { steps } => {
                reindex::run_reindex_step(&bridge, steps, reporter.as_ref())?
            }
            ReindexAction::Run => reindex::run_reindex_run(&bridge, reporter.as_ref())?,
            ReindexAction::Status => reindex::run_reindex_status(&bridge)?,
            ReindexAction::Reset => reindex::run_reindex_reset(&bridge)?,
        },
        Commands::Diagnose => diagnose::run_diagnose(&bridge)?,
    }

    Ok(())
}
