//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::guard::ParamGuard;
use super::types::{NextPage, PaginationState, Paginator, StopReason, StopRules};
use crate::config::{FetchConfig, PaginationType};

/// Build the paginator a config asks for
pub fn paginator_for(config: &FetchConfig, guard: &ParamGuard) -> Box<dyn Paginator> {
    if !config.enable_pagination {
        return Box::new(NoPaginator);
    }

    let rules = StopRules {
        page_size: config.page_size,
        end_page: config.end_page,
        max_pages: config.max_pages,
    };
    let size = guard
        .size_param
        .clone()
        .map(|param| (param, config.page_size));

    match config.pagination_type {
        PaginationType::Page => Box::new(PageNumberPaginator {
            page_param: guard.counter_param.clone(),
            start_page: config.start_value(),
            step: config.step(),
            size,
            rules,
        }),
        PaginationType::Offset => Box::new(OffsetPaginator {
            offset_param: guard.counter_param.clone(),
            start_offset: config.start_value(),
            step: config.step(),
            size,
            rules,
        }),
    }
}

fn counter_params(
    param: Option<&String>,
    size: Option<&(String, u32)>,
    counter: u64,
) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(2);
    if let Some(param) = param {
        params.push((param.clone(), counter.to_string()));
    }
    if let Some((name, value)) = size {
        params.push((name.clone(), value.to_string()));
    }
    params
}

fn advance_or_stop(
    rules: &StopRules,
    caller_paginated: bool,
    step: u64,
    records_count: usize,
    state: &mut PaginationState,
) -> NextPage {
    state.record_page();

    let reason = rules.check(records_count, step, state).or_else(|| {
        // Without our own counter parameter every request would be identical
        caller_paginated.then_some(StopReason::CallerPaginated)
    });

    if let Some(reason) = reason {
        return NextPage::Done(reason);
    }

    state.advance(step);
    NextPage::Continue {
        counter: state.counter,
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Common patterns:
/// - `?page=2`
/// - `?page=2&limit=50`
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter for the page number; `None` when the URL already has one
    pub page_param: Option<String>,
    /// First page number (usually 0 or 1)
    pub start_page: u64,
    /// Page increment
    pub step: u64,
    /// Page size parameter and value
    pub size: Option<(String, u32)>,
    /// Termination rules
    pub rules: StopRules,
}

impl PageNumberPaginator {
    /// Create a new page number paginator
    pub fn new(page_param: impl Into<String>, start_page: u64, page_size: u32) -> Self {
        Self {
            page_param: Some(page_param.into()),
            start_page,
            step: 1,
            size: None,
            rules: StopRules {
                page_size,
                end_page: None,
                max_pages: u64::MAX,
            },
        }
    }

    /// Send the page size as a query parameter
    #[must_use]
    pub fn with_size_param(mut self, param: impl Into<String>) -> Self {
        self.size = Some((param.into(), self.rules.page_size));
        self
    }

    /// Stop after this page
    #[must_use]
    pub fn with_end_page(mut self, end: u64) -> Self {
        self.rules.end_page = Some(end);
        self
    }
}

impl Paginator for PageNumberPaginator {
    fn initial_state(&self) -> PaginationState {
        PaginationState::starting_at(self.start_page)
    }

    fn params(&self, state: &PaginationState) -> Vec<(String, String)> {
        counter_params(self.page_param.as_ref(), self.size.as_ref(), state.counter)
    }

    fn process_page(&self, records_count: usize, state: &mut PaginationState) -> NextPage {
        advance_or_stop(
            &self.rules,
            self.page_param.is_none(),
            self.step,
            records_count,
            state,
        )
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// Common patterns:
/// - `?offset=100&limit=50`
/// - `?start=100&limit=50`
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter for the offset; `None` when the URL already has one
    pub offset_param: Option<String>,
    /// First offset
    pub start_offset: u64,
    /// Offset increment, normally the page size
    pub step: u64,
    /// Page size parameter and value
    pub size: Option<(String, u32)>,
    /// Termination rules
    pub rules: StopRules,
}

impl OffsetPaginator {
    /// Create a new offset paginator stepping by `limit`
    pub fn new(offset_param: impl Into<String>, limit_param: impl Into<String>, limit: u32) -> Self {
        Self {
            offset_param: Some(offset_param.into()),
            start_offset: 0,
            step: u64::from(limit),
            size: Some((limit_param.into(), limit)),
            rules: StopRules {
                page_size: limit,
                end_page: None,
                max_pages: u64::MAX,
            },
        }
    }
}

impl Paginator for OffsetPaginator {
    fn initial_state(&self) -> PaginationState {
        PaginationState::starting_at(self.start_offset)
    }

    fn params(&self, state: &PaginationState) -> Vec<(String, String)> {
        counter_params(self.offset_param.as_ref(), self.size.as_ref(), state.counter)
    }

    fn process_page(&self, records_count: usize, state: &mut PaginationState) -> NextPage {
        advance_or_stop(
            &self.rules,
            self.offset_param.is_none(),
            self.step,
            records_count,
            state,
        )
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn initial_state(&self) -> PaginationState {
        PaginationState::default()
    }

    fn params(&self, _state: &PaginationState) -> Vec<(String, String)> {
        Vec::new()
    }

    fn process_page(&self, _records_count: usize, state: &mut PaginationState) -> NextPage {
        state.record_page();
        NextPage::Done(StopReason::PaginationDisabled)
    }
}
