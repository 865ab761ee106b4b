//! Ingestion pipeline
//!
//! Runs one ingestion: fetch every page, then infer the schema of what came
//! back. The resulting report is what a table-provisioning step consumes.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::fetcher::{FetchResult, PaginatedFetcher};
use crate::pagination::StopReason;
use crate::schema::{SchemaAnalysisResult, SchemaAnalyzer};
use crate::types::Record;
use serde::Serialize;
use tracing::info;

/// Outcome of a full ingestion run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    /// Destination table
    pub table_name: String,
    /// Pages the data spans
    pub total_pages: u64,
    /// Reported or counted total
    pub total_records: u64,
    /// Requests issued
    pub pages_processed: u64,
    /// Why fetching stopped
    pub stop_reason: StopReason,
    /// Inferred schema
    pub schema: SchemaAnalysisResult,
    /// Fetched records
    pub records: Vec<Record>,
}

impl IngestionReport {
    fn new(fetch: FetchResult, schema: SchemaAnalysisResult) -> Self {
        Self {
            table_name: schema.table_name.clone(),
            total_pages: fetch.total_pages,
            total_records: fetch.total_records,
            pages_processed: fetch.pages_processed,
            stop_reason: fetch.stop_reason,
            schema,
            records: fetch.all_records,
        }
    }
}

/// Fetch everything `config` describes and infer its schema
pub async fn ingest(
    fetcher: &PaginatedFetcher,
    config: &FetchConfig,
    analyzer: &SchemaAnalyzer,
) -> Result<IngestionReport> {
    let fetch = fetcher.fetch_all(config).await?;

    if fetch.all_records.is_empty() {
        return Err(Error::empty_input(format!(
            "{} returned no records after {} page(s)",
            config.api_url, fetch.pages_processed
        )));
    }

    let schema = analyzer.analyze(&fetch.all_records)?;
    info!(
        "Ingested {} records into {} ({} fields)",
        fetch.all_records.len(),
        schema.table_name,
        schema.total_fields
    );

    Ok(IngestionReport::new(fetch, schema))
}
