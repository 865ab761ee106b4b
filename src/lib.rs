// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # api-ingest
//!
//! Fetches every page of a paginated JSON API and infers a relational
//! schema for the records it returns.
//!
//! ## Features
//!
//! - **Page and Offset Pagination**: Counter-driven paging with endPage, short-page and empty-page stops
//! - **Query Preservation**: Filters embedded in the endpoint URL are sent on every page
//! - **Envelope Detection**: Records found under `data`, `items`, `results` or a configured path
//! - **Bounded Retries**: 5xx and network failures retried, 4xx fails fast
//! - **Schema Inference**: Flattened columns with types, nullability and sized storage types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use api_ingest::{ingest, FetchConfig, PaginatedFetcher, Result, SchemaAnalyzer};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = FetchConfig::new("https://api.example.com/posts?userId=1")
//!         .with_page_pagination("page", 1)
//!         .with_page_size(20);
//!
//!     let fetcher = PaginatedFetcher::http()?;
//!     let analyzer = SchemaAnalyzer::for_session("posts");
//!
//!     let report = ingest(&fetcher, &config, &analyzer).await?;
//!     for field in &report.schema.fields {
//!         println!("{} {}", field.name, field.storage_type);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         Pipeline                          │
//! │        ingest(config) → fetch_all → analyze → report      │
//! └───────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬──────────────┬─┴────────────┬────────────────┐
//! │   HTTP     │  Pagination  │   Decode     │    Schema      │
//! ├────────────┼──────────────┼──────────────┼────────────────┤
//! │ Transport  │ Page number  │ dataPath     │ Flatten        │
//! │ Retry      │ Offset       │ data/items   │ Type precedence│
//! │ Rate Limit │ Param guard  │ results      │ Storage types  │
//! │ Targets    │ Stop rules   │ Wrap         │ Nullability    │
//! └────────────┴──────────────┴──────────────┴────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Fetch configuration
pub mod config;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Record extraction from response envelopes
pub mod decode;

/// Pagination strategies and stop rules
pub mod pagination;

/// Paginated fetch orchestration
pub mod fetcher;

/// Schema inference from JSON records
pub mod schema;

/// Fetch-then-analyze pipeline
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{load_fetch_config, FetchConfig, PaginationType};
pub use error::{Error, ErrorKind, Result};
pub use fetcher::{FetchProgress, FetchResult, FetchStatus, PaginatedFetcher};
pub use pipeline::{ingest, IngestionReport};
pub use schema::{FieldAnalysis, FieldType, SchemaAnalysisResult, SchemaAnalyzer, StorageType};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
