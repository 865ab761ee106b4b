//! Fetcher types
//!
//! Progress snapshots and the result of a completed run.

use crate::pagination::StopReason;
use crate::types::Record;
use serde::Serialize;

/// Lifecycle of a fetch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Config validated, no request issued yet
    Starting,
    /// At least one page fetched, more may follow
    Fetching,
    /// All pages fetched
    Completed,
    /// The run aborted
    Error,
}

/// Snapshot of a run, pushed to a [`ProgressSink`] after every page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchProgress {
    /// Run status
    pub status: FetchStatus,
    /// Pages requested so far
    pub current_page: u64,
    /// Records accumulated so far
    pub fetched_records: u64,
    /// Grand total reported by the API, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
    /// Share of `total_records` fetched, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    /// Error text for the `error` status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FetchProgress {
    /// Snapshot taken before the first request
    pub fn starting() -> Self {
        Self {
            status: FetchStatus::Starting,
            current_page: 0,
            fetched_records: 0,
            total_records: None,
            percentage: None,
            message: None,
        }
    }

    /// Snapshot after a page
    pub fn fetching(current_page: u64, fetched_records: u64, total_records: Option<u64>) -> Self {
        Self {
            status: FetchStatus::Fetching,
            current_page,
            fetched_records,
            total_records,
            percentage: percentage(fetched_records, total_records),
            message: None,
        }
    }

    /// Final snapshot of a successful run
    pub fn completed(pages: u64, fetched_records: u64, total_records: Option<u64>) -> Self {
        Self {
            status: FetchStatus::Completed,
            ..Self::fetching(pages, fetched_records, total_records)
        }
    }

    /// Final snapshot of a failed run
    pub fn error(current_page: u64, fetched_records: u64, message: impl Into<String>) -> Self {
        Self {
            status: FetchStatus::Error,
            current_page,
            fetched_records,
            total_records: None,
            percentage: None,
            message: Some(message.into()),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(fetched: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(0) => Some(100.0),
        Some(total) => Some((fetched as f64 / total as f64 * 100.0).min(100.0)),
        None => None,
    }
}

/// Receives progress snapshots
pub trait ProgressSink: Send + Sync {
    /// Called at run start, after every page, and at run end
    fn report(&self, progress: &FetchProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&FetchProgress) + Send + Sync,
{
    fn report(&self, progress: &FetchProgress) {
        self(progress);
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// Every record from every page, in page order
    pub all_records: Vec<Record>,
    /// Pages the data spans
    pub total_pages: u64,
    /// Reported grand total, or the number of records fetched
    pub total_records: u64,
    /// Requests issued
    pub pages_processed: u64,
    /// Why the run stopped
    pub stop_reason: StopReason,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
}

impl FetchResult {
    /// Number of records actually fetched
    pub fn fetched_records(&self) -> usize {
        self.all_records.len()
    }
}
