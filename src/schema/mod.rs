//! Schema inference module
//!
//! Infers a relational schema from a batch of semi-structured JSON records.
//!
//! # Features
//!
//! - **Flattening**: Nested objects become `parent_child` columns; arrays become JSON text
//! - **Type Inference**: One type per field, resolved by a fixed precedence table
//! - **Nullable Detection**: Fields missing or null in any record are nullable
//! - **Storage Mapping**: Column types sized from the observed values

mod flatten;
mod inference;
mod storage;
mod types;

pub use flatten::{flatten_record, KEY_SEPARATOR};
pub use inference::{table_name_for, SchemaAnalyzer, DEFAULT_MAX_SAMPLES};
pub use storage::{
    storage_type_for, ObservedSize, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE, MEDIUM_TEXT_LIMIT,
    SHORT_TEXT_LIMIT, TEXT_LIMIT,
};
pub use types::{FieldAnalysis, FieldType, SchemaAnalysisResult, StorageType};
