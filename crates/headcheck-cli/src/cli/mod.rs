//! CLI for headcheck.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use headcheck_core::config;
use headcheck_core::store::ItemDb;
use std::path::PathBuf;

use commands::{
    run_add, run_completions, run_fetch_headers, run_import, run_man, run_status, FetchArgs,
};

/// Top-level CLI for headcheck.
#[derive(Debug, Parser)]
#[command(name = "headcheck")]
#[command(
    about = "headcheck: probe remote copies of content-addressed objects with HEAD requests",
    long_about = None
)]
pub struct Cli {
    /// Item database to use instead of ~/.local/state/headcheck/items.db.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Probe every eligible item with a HEAD request and record the headers.
    FetchHeaders {
        /// Number of concurrent probes (config default: 32).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Also probe items that previously returned 404/410.
        #[arg(long)]
        recheck: bool,
        /// Requests per second across all workers; negative for unlimited, 0 to pause.
        #[arg(long, value_name = "R", allow_negative_numbers = true)]
        rate_limit: Option<i64>,
        /// Results committed per database transaction (config default: 4096).
        #[arg(short = 'b', long, value_name = "N")]
        batch_size: Option<usize>,
    },

    /// Add one item to check.
    Add {
        /// 32-character lowercase hex content hash.
        hash: String,
        /// Remote URL of the object.
        url: String,
    },

    /// Import items from a file of `<hash> <url>` lines.
    Import {
        /// Path to the list; `-` reads stdin.
        path: PathBuf,
    },

    /// Show item counts per state.
    Status {
        /// Local object store; also count found items present there.
        #[arg(long, value_name = "DIR")]
        objects: Option<PathBuf>,
    },

    /// Print a shell completion script to stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // Neither needs config or the database.
        match &cli.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let db = match &cli.db {
            Some(path) => ItemDb::open_at(path).await?,
            None => ItemDb::open_default().await?,
        };

        let res = match cli.command {
            CliCommand::FetchHeaders {
                workers,
                recheck,
                rate_limit,
                batch_size,
            } => {
                let args = FetchArgs {
                    workers,
                    recheck,
                    rate_limit,
                    batch_size,
                };
                run_fetch_headers(&db, &cfg, args).await
            }
            CliCommand::Add { hash, url } => run_add(&db, &hash, &url).await,
            CliCommand::Import { path } => run_import(&db, &path).await,
            CliCommand::Status { objects } => {
                let objects = objects.or_else(|| cfg.objects_dir.clone());
                run_status(&db, objects.as_deref()).await
            }
            CliCommand::Completions { .. } | CliCommand::Man => Ok(()),
        };

        db.close().await;
        res
    }
}

#[cfg(test)]
mod tests;
