//! Gazette CLI
//!
//! Serves the content API and runs maintenance commands against the
//! configured storage backend.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gazette_cli::{GazetteConfig, commands};
use gazette_core::{EntryKind, parse_flag};
use gazette_storage::{ContentRepository, build_backend};
use tracing_subscriber::EnvFilter;

/// Gazette - Markdown content store and admin API
#[derive(Parser, Debug)]
#[command(name = "gazette", version, about, long_about = None)]
struct Args {
    /// Configuration file path (default: ./gazette.toml when present)
    #[arg(short, long, env = "GAZETTE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// List entries of a collection, newest first
    List {
        /// Collection (`articles` or `events`)
        kind: EntryKind,
        /// Only published entries
        #[arg(long)]
        published: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print one entry as JSON
    Show {
        /// Collection (`articles` or `events`)
        kind: EntryKind,
        /// Entry slug
        slug: String,
    },
    /// Publish or unpublish an entry; flips the flag when no state is given
    Publish {
        /// Collection (`articles` or `events`)
        kind: EntryKind,
        /// Entry slug
        slug: String,
        /// `true`/`false`, `on`/`off`, `yes`/`no`, `1`/`0`
        #[arg(value_parser = parse_state)]
        state: Option<bool>,
    },
    /// Delete an entry
    Remove {
        /// Collection (`articles` or `events`)
        kind: EntryKind,
        /// Entry slug
        slug: String,
    },
    /// Report stored files that fail to decode
    Check {
        /// Collection to check (default: all)
        kind: Option<EntryKind>,
    },
}

fn parse_state(value: &str) -> std::result::Result<bool, String> {
    parse_flag(value).ok_or_else(|| format!("'{value}' is not a boolean"))
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = GazetteConfig::load(args.config.as_deref())?;
    init_tracing(&config.logging.level);
    tracing::debug!(?config, "Configuration loaded");

    let repository = ContentRepository::new(build_backend(&config.storage)?);
    let mut out = std::io::stdout();

    match args.command {
        Command::Serve => commands::serve(&config.server, repository).await,
        Command::List {
            kind,
            published,
            json,
        } => commands::list(&repository, kind, published, json, &mut out).await,
        Command::Show { kind, slug } => commands::show(&repository, kind, &slug, &mut out).await,
        Command::Publish { kind, slug, state } => {
            commands::publish(&repository, kind, &slug, state, &mut out).await
        }
        Command::Remove { kind, slug } => {
            commands::remove(&repository, kind, &slug, &mut out).await
        }
        Command::Check { kind } => {
            let kinds = kind.map_or_else(|| EntryKind::ALL.to_vec(), |kind| vec![kind]);
            commands::check(&repository, &kinds, &mut out).await
        }
    }
}
