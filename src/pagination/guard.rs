//! Duplicate pagination parameter detection
//!
//! Callers often bake their own paging scheme into the URL. When the
//! embedded query already carries a parameter from the synonym allowlist,
//! no pagination parameters are added on top of it.

use crate::config::FetchConfig;
use crate::http::RequestTarget;
use tracing::debug;

/// Which pagination parameters a run may add to its requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamGuard {
    /// Counter parameter to send, if any
    pub counter_param: Option<String>,
    /// Page-size parameter to send, if any
    pub size_param: Option<String>,
    /// Embedded parameter that suppressed ours
    pub collision: Option<String>,
}

impl ParamGuard {
    /// Decide which pagination parameters `config` may add to `target`
    pub fn new(target: &RequestTarget, config: &FetchConfig) -> Self {
        if !config.enable_pagination {
            return Self::default();
        }

        let page_field = config.page_field();
        let names = config
            .pagination_synonyms
            .iter()
            .map(String::as_str)
            .chain(page_field);

        if let Some(existing) = target.find_any_param(names) {
            debug!(
                "URL already carries pagination parameter '{existing}', not adding '{}'",
                page_field.unwrap_or_default()
            );
            return Self {
                counter_param: None,
                size_param: None,
                collision: Some(existing.to_string()),
            };
        }

        let size_param = config
            .size_field()
            .filter(|size| !target.has_param(size))
            .map(ToString::to_string);

        Self {
            counter_param: page_field.map(ToString::to_string),
            size_param,
            collision: None,
        }
    }

    /// Names of every parameter this guard will send
    pub fn sent_names(&self) -> impl Iterator<Item = &str> {
        self.counter_param
            .iter()
            .chain(self.size_param.iter())
            .map(String::as_str)
    }
}
