//! Envelope matchers and the record extractor
//!
//! Each matcher checks one envelope convention. The chain order is the
//! precedence: the first matcher that matches wins.

use super::types::{EnvelopeShape, Extraction, Extractor};
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// Envelope matchers, tried in order
pub const ENVELOPE_CHAIN: &[(EnvelopeShape, Extractor)] = &[
    (EnvelopeShape::BareArray, is_array),
    (EnvelopeShape::Data, has_data_array),
    (EnvelopeShape::Items, has_items_array),
    (EnvelopeShape::Results, has_results_array),
];

fn is_array(body: &Value) -> Option<Vec<Value>> {
    body.as_array().cloned()
}

fn has_data_array(body: &Value) -> Option<Vec<Value>> {
    array_field(body, "data")
}

fn has_items_array(body: &Value) -> Option<Vec<Value>> {
    array_field(body, "items")
}

fn has_results_array(body: &Value) -> Option<Vec<Value>> {
    array_field(body, "results")
}

fn array_field(body: &Value, key: &str) -> Option<Vec<Value>> {
    body.get(key).and_then(Value::as_array).cloned()
}

fn fallback_wrap(body: &Value) -> Vec<Value> {
    vec![body.clone()]
}

// ============================================================================
// Record Extractor
// ============================================================================

/// Pulls records out of response bodies
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    /// Dotted path or JSONPath to the records
    data_path: Option<String>,
}

impl RecordExtractor {
    /// Create an extractor that relies on envelope detection alone
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with a configured record path
    pub fn with_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            data_path: (!path.trim().is_empty()).then_some(path),
        }
    }

    /// Create an extractor from an optional path
    pub fn from_option(path: Option<&str>) -> Self {
        path.map_or_else(Self::new, Self::with_path)
    }

    /// Extract records from a response body.
    ///
    /// Only an invalid JSONPath fails; every body shape yields an extraction.
    pub fn extract(&self, body: &Value) -> Result<Extraction> {
        if body.is_null() {
            return Ok(Extraction::new(Vec::new(), EnvelopeShape::Empty));
        }

        if let Some(path) = &self.data_path {
            return self.extract_configured(body, path);
        }

        for (shape, matches) in ENVELOPE_CHAIN {
            if let Some(records) = matches(body) {
                return Ok(Extraction::new(records, *shape));
            }
        }

        Ok(Extraction::new(fallback_wrap(body), EnvelopeShape::Wrapped))
    }

    fn extract_configured(&self, body: &Value, path: &str) -> Result<Extraction> {
        // Wildcards need a real JSONPath engine, plain dotted paths do not
        if path.contains('*') {
            let records = extract_with_jsonpath(body, path)?;
            return Ok(Extraction::new(records, EnvelopeShape::DataPath));
        }

        match extract_path(body, path) {
            Some(Value::Array(records)) => Ok(Extraction::new(records.clone(), EnvelopeShape::DataPath)),
            Some(Value::Null) | None => {
                debug!("Data path '{path}' not present in response");
                Ok(Extraction::new(Vec::new(), EnvelopeShape::Empty))
            }
            Some(other) => Ok(Extraction::new(vec![other.clone()], EnvelopeShape::DataPath)),
        }
    }
}

/// Follow a dotted path (`data.items`, `$.meta.total`, `rows[0]`) into a value
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: usize = index_str.parse().ok()?;
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current)
}

/// Extract using JSONPath
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
