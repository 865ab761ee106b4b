//! Error types for api-ingest
//!
//! This module defines the error hierarchy shared by the fetcher and the
//! schema analyzer. All public APIs return `Result<T, Error>` where Error is
//! defined here. Every error belongs to one [`ErrorKind`] so callers can tell
//! a bad configuration apart from a failing upstream without matching on
//! individual variants.

use thiserror::Error;

/// Broad category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad URL, missing pagination field, request rejected with 4xx
    Configuration,
    /// Network failure or 5xx after exhausting retries
    Transport,
    /// Response body or config text could not be decoded
    Decode,
    /// Schema inference was given nothing to analyze
    EmptyInput,
    /// Local I/O
    Io,
    /// Anything else
    Other,
}

/// The main error type for api-ingest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request for page {page} rejected with HTTP {status}: {body}")]
    RequestRejected { page: u64, status: u16, body: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Fetching page {page} failed: {source}")]
    PageFailed {
        page: u64,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Decode Errors
    // ============================================================================
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Nothing to analyze: {message}")]
    EmptyInput { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Attach the page number a failure happened on.
    ///
    /// A 4xx response becomes [`Error::RequestRejected`] so it reports as a
    /// configuration problem; everything else is wrapped in
    /// [`Error::PageFailed`].
    pub fn on_page(self, page: u64) -> Self {
        match self {
            Error::HttpStatus { status, body } if (400..500).contains(&status) => {
                Error::RequestRejected { page, status, body }
            }
            already @ (Error::RequestRejected { .. } | Error::PageFailed { .. }) => already,
            other => Error::PageFailed {
                page,
                source: Box::new(other),
            },
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::InvalidUrl(_)
            | Error::RequestRejected { .. } => ErrorKind::Configuration,
            Error::HttpStatus { status, .. } if *status < 500 => ErrorKind::Configuration,
            Error::Http(_) | Error::HttpStatus { .. } | Error::Timeout { .. } => {
                ErrorKind::Transport
            }
            Error::PageFailed { source, .. } => source.kind(),
            Error::YamlParse(_) | Error::JsonParse(_) | Error::JsonPath { .. } | Error::Decode { .. } => {
                ErrorKind::Decode
            }
            Error::EmptyInput { .. } => ErrorKind::EmptyInput,
            Error::Io(_) => ErrorKind::Io,
            Error::Other(_) | Error::Anyhow(_) => ErrorKind::Other,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Only server errors are retried; anything below 500 is final
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status >= 500
}

/// Result type alias for api-ingest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
