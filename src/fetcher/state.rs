//! Fetch loop state machine
//!
//! One transition per iteration:
//!
//! ```text
//! Fetching --page ok, continue--> Fetching
//! Fetching --page ok, stop------> LastPageReached --> Completed
//! Fetching --page failed--------> Aborted
//! ```

use crate::error::Error;
use crate::pagination::{NextPage, StopReason};

/// State of a fetch run
#[derive(Debug)]
pub enum FetchState {
    /// Requesting the page at `counter`
    Fetching {
        /// Pagination counter for the request
        counter: u64,
    },
    /// The last page arrived; totals still to be settled
    LastPageReached(StopReason),
    /// A page failed; accumulated records are discarded
    Aborted(Error),
    /// Terminal success
    Completed(StopReason),
}

impl FetchState {
    /// Initial state
    pub fn start(counter: u64) -> Self {
        Self::Fetching { counter }
    }

    /// Transition after a page was fetched and counted
    pub fn after_page(next: NextPage) -> Self {
        match next {
            NextPage::Continue { counter } => Self::Fetching { counter },
            NextPage::Done(reason) => Self::LastPageReached(reason),
        }
    }

    /// Transition after a page request failed
    pub fn after_failure(error: Error) -> Self {
        Self::Aborted(error)
    }

    /// Settle a finished run
    pub fn finish(self) -> Self {
        match self {
            Self::LastPageReached(reason) => Self::Completed(reason),
            other => other,
        }
    }

    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted(_) | Self::Completed(_))
    }
}
