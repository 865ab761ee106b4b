//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_fetch_config, FetchConfig};
use crate::error::{Error, Result, ResultExt};
use crate::fetcher::{FetchProgress, PaginatedFetcher};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::pipeline::ingest;
use crate::schema::SchemaAnalyzer;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Transport settings shared by `fetch` and `ingest`
#[derive(Debug, Clone, Copy)]
struct TransportOptions {
    timeout_secs: u64,
    max_retries: u32,
    rate_limit: u32,
    progress: bool,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                progress,
                summary_only,
                timeout_secs,
                max_retries,
                rate_limit,
            } => {
                let options = TransportOptions {
                    timeout_secs: *timeout_secs,
                    max_retries: *max_retries,
                    rate_limit: *rate_limit,
                    progress: *progress,
                };
                self.fetch(options, *summary_only).await
            }
            Commands::Analyze { input, max_samples } => {
                self.analyze(input.as_deref(), *max_samples)
            }
            Commands::Ingest {
                progress,
                timeout_secs,
                max_retries,
                rate_limit,
            } => {
                let options = TransportOptions {
                    timeout_secs: *timeout_secs,
                    max_retries: *max_retries,
                    rate_limit: *rate_limit,
                    progress: *progress,
                };
                self.ingest(options).await
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the fetch configuration
    fn load_config(&self) -> Result<FetchConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return FetchConfig::from_json_str(json_str);
        }

        match &self.cli.config {
            Some(path) => load_fetch_config(path),
            None => Err(Error::config(
                "No fetch configuration given (use --config or --config-json)",
            )),
        }
    }

    /// Build a fetcher over a configured HTTP client
    fn build_fetcher(&self, options: TransportOptions) -> Result<PaginatedFetcher> {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .max_retries(options.max_retries);
        if options.rate_limit > 0 {
            builder = builder.rate_limit(RateLimiterConfig::per_second(options.rate_limit));
        }

        let client = HttpClient::with_config(builder.build())?;
        let fetcher = PaginatedFetcher::new(Arc::new(client));

        if !options.progress {
            return Ok(fetcher);
        }
        let format = self.cli.format;
        Ok(fetcher.with_progress(move |progress: &FetchProgress| {
            emit(
                format,
                &json!({
                    "type": "PROGRESS",
                    "progress": progress,
                }),
            );
        }))
    }

    /// Fetch every page
    async fn fetch(&self, options: TransportOptions, summary_only: bool) -> Result<()> {
        let config = self.load_config()?;
        let fetcher = self.build_fetcher(options)?;
        let mut result = fetcher.fetch_all(&config).await?;

        let fetched = result.fetched_records();
        if summary_only {
            result.all_records.clear();
        }

        self.output_message(&json!({
            "type": "FETCH_RESULT",
            "fetchedRecords": fetched,
            "result": result,
        }));

        Ok(())
    }

    /// Infer a schema from a records file or stdin
    fn analyze(&self, input: Option<&Path>, max_samples: usize) -> Result<()> {
        let content = match input {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::config(format!(
                    "Failed to read records file '{}': {e}",
                    path.display()
                ))
            })?,
            None => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read records from stdin")?;
                buffer
            }
        };

        let records: Value = serde_json::from_str(&content)?;
        let analyzer = SchemaAnalyzer::for_session(&self.cli.session).with_max_samples(max_samples);
        let schema = analyzer.analyze_value(&records)?;
        debug!("Inferred {} fields for {}", schema.total_fields, schema.table_name);

        self.output_message(&json!({
            "type": "SCHEMA",
            "schema": schema,
        }));

        Ok(())
    }

    /// Fetch, then infer the schema
    async fn ingest(&self, options: TransportOptions) -> Result<()> {
        let config = self.load_config()?;
        let fetcher = self.build_fetcher(options)?;
        let analyzer = SchemaAnalyzer::for_session(&self.cli.session);

        let report = ingest(&fetcher, &config, &analyzer).await?;

        self.output_message(&json!({
            "type": "INGESTION",
            "report": report,
        }));

        Ok(())
    }

    /// Validate the fetch configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        config.validate()?;

        let paging = match config.page_field().filter(|_| config.enable_pagination) {
            Some(field) => format!("paginated on '{field}' from {}", config.start_value()),
            None => "not paginated".to_string(),
        };

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Config for {} is valid ({paging})", config.api_url)
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &impl Serialize) {
        emit(self.cli.format, msg);
    }
}

/// Print one message in the requested format
fn emit(format: OutputFormat, msg: &impl Serialize) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(msg),
        OutputFormat::Pretty => serde_json::to_string_pretty(msg),
    };
    println!("{}", rendered.unwrap_or_default());
}
