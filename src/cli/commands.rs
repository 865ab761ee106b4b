//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated API ingestion CLI
#[derive(Parser, Debug)]
#[command(name = "api-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Fetch configuration file (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline fetch configuration JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Session the ingested records belong to
    #[arg(short, long, global = true, default_value = "default")]
    pub session: String,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every page of the configured endpoint
    Fetch {
        /// Emit a progress message after each page
        #[arg(long)]
        progress: bool,

        /// Leave records out of the output
        #[arg(long)]
        summary_only: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Retries for 5xx and network failures
        #[arg(long, default_value = "3")]
        max_retries: u32,

        /// Requests per second (0 = unlimited)
        #[arg(long, default_value = "0")]
        rate_limit: u32,
    },

    /// Infer a schema from a JSON array of records
    Analyze {
        /// Records file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Sample values kept per field
        #[arg(long, default_value = "5")]
        max_samples: usize,
    },

    /// Fetch every page, then infer the schema of the result
    Ingest {
        /// Emit a progress message after each page
        #[arg(long)]
        progress: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Retries for 5xx and network failures
        #[arg(long, default_value = "3")]
        max_retries: u32,

        /// Requests per second (0 = unlimited)
        #[arg(long, default_value = "0")]
        rate_limit: u32,
    },

    /// Validate a fetch configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
