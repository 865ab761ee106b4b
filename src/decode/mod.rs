//! Record extraction module
//!
//! Finds the record array inside a response body.
//!
//! # Overview
//!
//! Target APIs wrap their records in whatever envelope they like. Extraction
//! tries a configured path first, then an ordered chain of envelope matchers:
//! bare array, `data`, `items`, `results`. When nothing matches the whole
//! body becomes a single record, so an odd response shape never fails a page.

mod extractors;
mod types;

pub use extractors::{extract_path, RecordExtractor, ENVELOPE_CHAIN};
pub use types::{EnvelopeShape, Extraction, Extractor};
