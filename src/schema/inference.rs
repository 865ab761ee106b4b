//! Schema inference from JSON records

use super::flatten::flatten_record;
use super::storage::{cap_decimal, storage_type_for, ObservedSize};
use super::types::{FieldAnalysis, FieldType, SchemaAnalysisResult};
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use url::Url;

/// Default number of sample values kept per field
pub const DEFAULT_MAX_SAMPLES: usize = 5;

static DATE_LIKE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}[-/]\d{1,2}[-/]\d{1,2}([T ]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?|\d{1,2}[-/]\d{1,2}[-/]\d{4})$",
    )
    .ok()
});

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y"];

/// Infers a relational schema from heterogeneous JSON records
#[derive(Debug, Clone)]
pub struct SchemaAnalyzer {
    /// Session the records belong to
    session_id: String,
    /// Samples kept per field
    max_samples: usize,
    /// Detect dates in strings
    detect_dates: bool,
    /// Detect email addresses in strings
    detect_emails: bool,
    /// Detect URLs in strings
    detect_urls: bool,
}

impl SchemaAnalyzer {
    /// Create an analyzer for the given session
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            max_samples: DEFAULT_MAX_SAMPLES,
            detect_dates: true,
            detect_emails: true,
            detect_urls: true,
        }
    }

    /// Set the number of samples kept per field
    #[must_use]
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Enable/disable date detection
    #[must_use]
    pub fn with_date_detection(mut self, enabled: bool) -> Self {
        self.detect_dates = enabled;
        self
    }

    /// Enable/disable email detection
    #[must_use]
    pub fn with_email_detection(mut self, enabled: bool) -> Self {
        self.detect_emails = enabled;
        self
    }

    /// Enable/disable URL detection
    #[must_use]
    pub fn with_url_detection(mut self, enabled: bool) -> Self {
        self.detect_urls = enabled;
        self
    }

    /// Table name derived from the session id
    pub fn table_name(&self) -> String {
        table_name_for(&self.session_id)
    }

    /// Analyze a JSON value that must be a non-empty array of records
    pub fn analyze_value(&self, value: &Value) -> Result<SchemaAnalysisResult> {
        match value {
            Value::Array(records) => self.analyze(records),
            other => Err(Error::empty_input(format!(
                "expected an array of records, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Analyze a batch of records.
    ///
    /// Records that are not objects are skipped. Fails when there is no
    /// object record to analyze.
    pub fn analyze(&self, records: &[Value]) -> Result<SchemaAnalysisResult> {
        if records.is_empty() {
            return Err(Error::empty_input("no records to analyze"));
        }

        let mut fields: BTreeMap<String, FieldStats> = BTreeMap::new();
        let mut object_count = 0usize;

        for (index, record) in records.iter().enumerate() {
            let Value::Object(map) = record else {
                debug!("Skipping record {index}: {} is not an object", json_kind(record));
                continue;
            };
            object_count += 1;

            let mut seen: BTreeSet<String> = BTreeSet::new();
            for (name, value) in flatten_record(map) {
                // `{"a_b": 1, "a": {"b": 2}}` flattens to two `a_b` columns
                if !seen.insert(name.clone()) {
                    warn!(
                        "Record {index}: column '{name}' produced twice by flattening, keeping the first value"
                    );
                    continue;
                }
                fields
                    .entry(name)
                    .or_default()
                    .observe(value, self);
            }
        }

        if object_count == 0 {
            return Err(Error::empty_input(format!(
                "none of the {} records is a JSON object",
                records.len()
            )));
        }

        let fields: Vec<FieldAnalysis> = fields
            .into_iter()
            .map(|(name, stats)| stats.into_analysis(name, object_count))
            .collect();

        debug!(
            "Analyzed {object_count} records into {} fields",
            fields.len()
        );

        Ok(SchemaAnalysisResult {
            total_fields: fields.len(),
            fields,
            table_name: self.table_name(),
        })
    }

    /// Classify one non-null value
    pub fn classify(&self, value: &Value) -> Option<FieldType> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(FieldType::Boolean),
            Value::Number(n) => Some(classify_number(n)),
            Value::String(s) => Some(self.classify_str(s)),
            // Flattening turns these into strings; classify them as text anyway
            Value::Array(_) | Value::Object(_) => Some(FieldType::String),
        }
    }

    fn classify_str(&self, s: &str) -> FieldType {
        if self.detect_dates && is_date(s) {
            FieldType::Date
        } else if self.detect_emails && is_email(s) {
            FieldType::Email
        } else if self.detect_urls && is_url(s) {
            FieldType::Url
        } else {
            FieldType::String
        }
    }
}

/// Table name for a session: `session_<id>`, lowercased, with every
/// character outside `[a-z0-9]` replaced by `_`
pub fn table_name_for(session_id: &str) -> String {
    let normalized: String = session_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("session_{normalized}")
}

// ============================================================================
// Per-field Accumulator
// ============================================================================

/// Everything observed about one field
#[derive(Debug, Default)]
struct FieldStats {
    /// Records with a non-null value
    present: usize,
    /// Observed value types
    types: BTreeSet<FieldType>,
    /// Longest value in characters
    max_length: usize,
    /// Most integer digits of any numeric value
    max_integer_digits: u32,
    /// Most fractional digits of any numeric value
    max_scale: u32,
    /// Distinct values in first-seen order
    samples: Vec<Value>,
}

impl FieldStats {
    fn observe(&mut self, value: Value, analyzer: &SchemaAnalyzer) {
        let Some(value_type) = analyzer.classify(&value) else {
            return;
        };

        self.present += 1;
        self.types.insert(value_type);
        self.max_length = self.max_length.max(text_length(&value));

        if let Value::Number(n) = &value {
            let (integer_digits, scale) = digits(n);
            self.max_integer_digits = self.max_integer_digits.max(integer_digits);
            self.max_scale = self.max_scale.max(scale);
        }

        if self.samples.len() < analyzer.max_samples && !self.samples.contains(&value) {
            self.samples.push(value);
        }
    }

    fn into_analysis(self, name: String, record_count: usize) -> FieldAnalysis {
        let field_type = FieldType::resolve(self.types.iter().copied());
        let (precision, scale) = if self.max_integer_digits + self.max_scale == 0 {
            (0, 0)
        } else {
            cap_decimal(self.max_integer_digits + self.max_scale, self.max_scale)
        };

        let storage_type = storage_type_for(
            field_type,
            ObservedSize {
                max_length: self.max_length,
                precision,
                scale,
            },
        );

        let is_number = field_type == FieldType::Number;
        FieldAnalysis {
            name,
            field_type,
            storage_type,
            nullable: self.present < record_count,
            max_length: field_type.is_textual().then_some(self.max_length),
            precision: (is_number && precision > 0).then_some(precision),
            scale: (is_number && precision > 0).then_some(scale),
            sample_values: self.samples,
        }
    }
}

// ============================================================================
// Classifiers
// ============================================================================

/// Integers only when they fit a signed 64-bit column
fn classify_number(n: &Number) -> FieldType {
    if n.is_i64() {
        return FieldType::Integer;
    }
    if n.is_u64() {
        // Above i64::MAX
        return FieldType::Number;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && fits_i64(f) => FieldType::Integer,
        _ => FieldType::Number,
    }
}

fn fits_i64(f: f64) -> bool {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
    f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Digits before and after the decimal point
fn digits(n: &Number) -> (u32, u32) {
    let text = if n.is_i64() || n.is_u64() {
        n.to_string()
    } else {
        // f64's Display never uses exponent notation
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    };
    let text = text.trim_start_matches('-');

    let (integer, fraction) = text.split_once('.').unwrap_or((text, ""));
    let integer = integer.trim_start_matches('0');
    (integer.len() as u32, fraction.len() as u32)
}

fn text_length(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

/// Date-shaped and parses as a real calendar date
fn is_date(s: &str) -> bool {
    let s = s.trim();
    if !DATE_LIKE.as_ref().is_some_and(|re| re.is_match(s)) {
        return false;
    }

    DateTime::parse_from_rfc3339(s).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(s, fmt).is_ok())
}

fn is_email(s: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(s))
}

/// Parses as an absolute URL with a host
fn is_url(s: &str) -> bool {
    !s.chars().any(char::is_whitespace) && Url::parse(s).is_ok_and(|url| url.has_host())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
