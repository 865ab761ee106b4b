//! Paginated fetcher
//!
//! Walks an HTTP endpoint page by page and accumulates every record.
//!
//! # Overview
//!
//! - `PaginatedFetcher` - Drives one run against an injected [`Transport`]
//! - `FetchState` - The loop's state machine
//! - `FetchProgress` / `ProgressSink` - Per-page progress reporting
//!
//! A run is strictly sequential: one request in flight, a fixed pause
//! between pages. Any page failure aborts the run and the records gathered
//! so far are dropped.

mod state;
mod types;

pub use state::FetchState;
pub use types::{FetchProgress, FetchResult, FetchStatus, ProgressSink};

use crate::config::FetchConfig;
use crate::decode::{extract_path, RecordExtractor};
use crate::error::Result;
use crate::http::{HttpClient, PageRequest, RequestTarget, Transport};
use crate::pagination::{paginator_for, ParamGuard};
use crate::types::{JsonValue, Record};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetches every page of a configured endpoint
#[derive(Clone)]
pub struct PaginatedFetcher {
    transport: Arc<dyn Transport>,
    progress: Option<Arc<dyn ProgressSink>>,
}

/// Records and metadata from one page
struct Page {
    records: Vec<Record>,
    reported_total: Option<u64>,
}

impl PaginatedFetcher {
    /// Create a fetcher over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            progress: None,
        }
    }

    /// Create a fetcher over a default [`HttpClient`]
    pub fn http() -> Result<Self> {
        Ok(Self::new(Arc::new(HttpClient::new()?)))
    }

    /// Report progress snapshots to `sink`
    #[must_use]
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// Fetch every page described by `config`.
    ///
    /// The config is validated before any request; a bad URL or a missing
    /// pagination field fails without touching the network.
    pub async fn fetch_all(&self, config: &FetchConfig) -> Result<FetchResult> {
        config.validate()?;

        let target = RequestTarget::from_url(config.parsed_url()?);
        let guard = ParamGuard::new(&target, config);
        let paginator = paginator_for(config, &guard);
        let extractor = RecordExtractor::from_option(config.data_path.as_deref());
        let fixed_params = merge_query_params(&target, config, &guard);
        let delay = config.inter_page_delay();

        info!(
            "Starting fetch: {} {} (pagination: {})",
            config.method,
            target.base_url(),
            if config.enable_pagination { "on" } else { "off" }
        );

        let started = Instant::now();
        self.report(&FetchProgress::starting());

        let mut page_state = paginator.initial_state();
        let mut all_records: Vec<Record> = Vec::new();
        let mut reported_total: Option<u64> = None;
        let mut state = FetchState::start(page_state.counter);

        let stop_reason = loop {
            state = match state {
                FetchState::Fetching { counter } => {
                    let page_number = page_state.pages + 1;
                    let mut params = fixed_params.clone();
                    params.extend(paginator.params(&page_state));
                    let request = build_request(config, &target, &params);

                    debug!("Requesting page {page_number} (counter {counter}): {}", request.url);

                    match self.fetch_page(&request, &extractor, config, page_number).await {
                        Ok(page) => {
                            if page.reported_total.is_some() {
                                reported_total = page.reported_total;
                            }
                            let count = page.records.len();
                            all_records.extend(page.records);

                            let next = paginator.process_page(count, &mut page_state);
                            debug!("Page {page_number}: {count} records");
                            self.report(&FetchProgress::fetching(
                                page_state.pages,
                                all_records.len() as u64,
                                reported_total,
                            ));

                            if next.is_continue() && !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            FetchState::after_page(next)
                        }
                        Err(e) => FetchState::after_failure(e),
                    }
                }
                last @ FetchState::LastPageReached(_) => last.finish(),
                FetchState::Aborted(error) => {
                    warn!(
                        "Fetch aborted on page {}: {error}; discarding {} records",
                        page_state.pages + 1,
                        all_records.len()
                    );
                    self.report(&FetchProgress::error(
                        page_state.pages,
                        all_records.len() as u64,
                        error.to_string(),
                    ));
                    return Err(error);
                }
                FetchState::Completed(reason) => break reason,
            };
        };

        if let Some(collision) = &guard.collision {
            debug!("Pagination parameter '{collision}' supplied by the URL");
        }

        let fetched = all_records.len() as u64;
        let total_records = reported_total.unwrap_or(fetched);
        let total_pages = if config.enable_pagination {
            total_records.div_ceil(u64::from(config.page_size))
        } else {
            page_state.pages
        };

        self.report(&FetchProgress::completed(
            page_state.pages,
            fetched,
            reported_total,
        ));

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            "Fetch completed: {fetched} records in {} pages ({stop_reason}, {duration_ms}ms)",
            page_state.pages
        );

        Ok(FetchResult {
            all_records,
            total_pages,
            total_records,
            pages_processed: page_state.pages,
            stop_reason,
            duration_ms,
        })
    }

    async fn fetch_page(
        &self,
        request: &PageRequest,
        extractor: &RecordExtractor,
        config: &FetchConfig,
        page_number: u64,
    ) -> Result<Page> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.on_page(page_number))?;

        let extraction = extractor
            .extract(&response.body)
            .map_err(|e| e.on_page(page_number))?;

        if extraction.is_fallback() {
            warn!(
                "Unexpected response shape on page {page_number}: no record array found, treating the body as one record"
            );
        }

        let reported_total = config
            .total_field
            .as_deref()
            .and_then(|field| read_total(&response.body, field));

        Ok(Page {
            records: extraction.records,
            reported_total,
        })
    }

    fn report(&self, progress: &FetchProgress) {
        if let Some(sink) = &self.progress {
            sink.report(progress);
        }
    }
}

impl std::fmt::Debug for PaginatedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedFetcher")
            .field("has_progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Config query parameters that neither the URL nor the paginator already set
fn merge_query_params(
    target: &RequestTarget,
    config: &FetchConfig,
    guard: &ParamGuard,
) -> Vec<(String, String)> {
    config
        .query_params
        .iter()
        .filter(|(key, _)| !target.has_param(key))
        .filter(|(key, _)| !guard.sent_names().any(|sent| sent.eq_ignore_ascii_case(key)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn build_request(
    config: &FetchConfig,
    target: &RequestTarget,
    params: &[(String, String)],
) -> PageRequest {
    PageRequest {
        method: config.method,
        url: target.url_with(params),
        headers: config.headers.clone(),
        body: if config.method.has_body() {
            config.body.clone()
        } else {
            None
        },
    }
}

/// Read a grand total that may arrive as a number or a numeric string
fn read_total(body: &JsonValue, field: &str) -> Option<u64> {
    match extract_path(body, field)? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
