//! Pagination types and traits
//!
//! Defines the counter state, the stop rules and the trait every strategy
//! implements.

use serde::Serialize;
use std::fmt;

/// Why a run stopped requesting pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The last page had no records
    EmptyPage,
    /// The configured end page was requested
    EndPageReached,
    /// The last page was shorter than the page size
    ShortPage,
    /// Pagination is disabled; one request only
    PaginationDisabled,
    /// The URL already paginates itself, so the counter cannot advance
    CallerPaginated,
    /// The page request cap was hit
    MaxPagesReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::EmptyPage => "empty page",
            StopReason::EndPageReached => "end page reached",
            StopReason::ShortPage => "short page",
            StopReason::PaginationDisabled => "pagination disabled",
            StopReason::CallerPaginated => "pagination parameter already in URL",
            StopReason::MaxPagesReached => "page cap reached",
        };
        f.write_str(text)
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Request another page with this counter value
    Continue {
        /// Counter for the next request
        counter: u64,
    },
    /// No more pages
    Done(StopReason),
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }

    /// Stop reason, if done
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Done(reason) => Some(*reason),
            Self::Continue { .. } => None,
        }
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Current counter value (page number or offset)
    pub counter: u64,
    /// Pages requested so far
    pub pages: u64,
}

impl PaginationState {
    /// Create state with a starting counter
    pub fn starting_at(counter: u64) -> Self {
        Self {
            counter,
            ..Default::default()
        }
    }

    /// Count a fetched page
    pub fn record_page(&mut self) {
        self.pages += 1;
    }

    /// Advance the counter
    pub fn advance(&mut self, step: u64) {
        self.counter = self.counter.saturating_add(step);
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// State for the first request
    fn initial_state(&self) -> PaginationState;

    /// Pagination query parameters for the request at `state`
    fn params(&self, state: &PaginationState) -> Vec<(String, String)>;

    /// Account for a fetched page and decide whether to continue
    fn process_page(&self, records_count: usize, state: &mut PaginationState) -> NextPage;
}

// ============================================================================
// Stop Rules
// ============================================================================

/// Termination rules shared by the counter strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRules {
    /// Expected records per page
    pub page_size: u32,
    /// Inclusive upper bound on the counter
    pub end_page: Option<u64>,
    /// Cap on pages requested
    pub max_pages: u64,
}

impl StopRules {
    /// Decide whether the page just recorded in `state` is the last one.
    ///
    /// Checked in order: empty page, explicit bound, short page (only
    /// without an explicit bound), page cap.
    pub fn check(&self, records_count: usize, step: u64, state: &PaginationState) -> Option<StopReason> {
        if records_count == 0 {
            return Some(StopReason::EmptyPage);
        }

        match self.end_page {
            Some(end) if state.counter.saturating_add(step) > end => {
                return Some(StopReason::EndPageReached);
            }
            Some(_) => {}
            None if records_count < self.page_size as usize => {
                return Some(StopReason::ShortPage);
            }
            None => {}
        }

        if state.pages >= self.max_pages {
            return Some(StopReason::MaxPagesReached);
        }

        None
    }
}
