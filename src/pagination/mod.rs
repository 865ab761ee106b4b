//! Pagination module
//!
//! Supports: Page Number, Offset, and single-request runs
//!
//! # Overview
//!
//! A [`Paginator`] owns the counter for one fetch run. After every page it
//! reports whether to continue, and if not, the [`StopReason`]. Most target
//! APIs offer no reliable "has more" flag, so the stop rules are heuristic:
//! an empty page, an explicit end page, or a page shorter than the page size.

mod guard;
mod strategies;
mod types;

pub use guard::ParamGuard;
pub use strategies::{paginator_for, NoPaginator, OffsetPaginator, PageNumberPaginator};
pub use types::{NextPage, PaginationState, Paginator, StopReason, StopRules};
