use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Search many video catalogs at once and stream results as they arrive
#[derive(Parser)]
#[command(name = "vodhub")]
#[command(about = "Meta-search over video catalog APIs", long_about = None)]
pub struct Cli {
    /// Configuration file (.json or .toml). Defaults to the platform config directory.
    #[arg(short, long, global = true, env = "VODHUB_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every configured source
    Search {
        /// Keyword to search for
        keyword: String,
        /// Print raw SSE frames (`data: <json>`) instead of a summary
        #[arg(long)]
        sse: bool,
    },
    /// List configured sources
    Sources,
    /// Serve the search and config endpoints over HTTP
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8000")]
        bind: String,
    },
}
