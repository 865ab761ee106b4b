//! CLI module
//!
//! Command-line interface for running ingestions.
//!
//! # Commands
//!
//! - `fetch` - Fetch every page of an endpoint
//! - `analyze` - Infer a schema from a JSON array of records
//! - `ingest` - Fetch, then infer the schema of the result
//! - `validate` - Check a fetch config without touching the network

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
