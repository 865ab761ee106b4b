//! Extraction types
//!
//! Describes which envelope a page's records were found in.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Envelope shape a page's records were found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeShape {
    /// The configured data path
    DataPath,
    /// The body itself is an array
    BareArray,
    /// `{ "data": [...] }`
    Data,
    /// `{ "items": [...] }`
    Items,
    /// `{ "results": [...] }`
    Results,
    /// Empty body or configured path absent
    Empty,
    /// No envelope recognised; the whole body is one record
    Wrapped,
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvelopeShape::DataPath => "data_path",
            EnvelopeShape::BareArray => "bare_array",
            EnvelopeShape::Data => "data",
            EnvelopeShape::Items => "items",
            EnvelopeShape::Results => "results",
            EnvelopeShape::Empty => "empty",
            EnvelopeShape::Wrapped => "wrapped",
        };
        f.write_str(name)
    }
}

/// Records pulled out of one response body
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Extracted records
    pub records: Vec<Value>,
    /// Where they were found
    pub shape: EnvelopeShape,
}

impl Extraction {
    /// Create an extraction
    pub fn new(records: Vec<Value>, shape: EnvelopeShape) -> Self {
        Self { records, shape }
    }

    /// Whether the body had to be wrapped as a single record
    pub fn is_fallback(&self) -> bool {
        self.shape == EnvelopeShape::Wrapped
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were found
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An envelope matcher: returns the records when the body has its shape
pub type Extractor = fn(&Value) -> Option<Vec<Value>>;
