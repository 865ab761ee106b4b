//! Schema types

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Field Type
// ============================================================================

/// Logical type of a field, resolved from every value it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Only nulls were seen
    Unknown,
    Boolean,
    /// Whole numbers
    Integer,
    /// Numbers with a fractional part
    Number,
    /// ISO-8601 and common `YYYY-MM-DD` style dates that parse
    Date,
    Email,
    Url,
    /// Free-form text
    String,
}

impl FieldType {
    /// Resolution order when a field holds values of several types.
    ///
    /// The first entry present among the observed types wins, so a single
    /// free-form string makes the whole field `string`.
    pub const PRECEDENCE: [FieldType; 7] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Integer,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Email,
        FieldType::Url,
    ];

    /// Resolve one type from the set of observed value types
    pub fn resolve<I>(observed: I) -> FieldType
    where
        I: IntoIterator<Item = FieldType>,
    {
        let observed: Vec<FieldType> = observed.into_iter().collect();
        Self::PRECEDENCE
            .iter()
            .copied()
            .find(|candidate| observed.contains(candidate))
            .unwrap_or(FieldType::Unknown)
    }

    /// Whether the column stores text
    pub fn is_textual(self) -> bool {
        matches!(self, FieldType::String | FieldType::Email | FieldType::Url)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Unknown => "unknown",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::String => "string",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Storage Type
// ============================================================================

/// Column type a field is stored as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Boolean,
    /// 64-bit integer
    BigInt,
    Decimal {
        precision: u32,
        scale: u32,
    },
    DateTime,
    Varchar(u32),
    Text,
    MediumText,
    LongText,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Boolean => write!(f, "BOOLEAN"),
            StorageType::BigInt => write!(f, "BIGINT"),
            StorageType::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            StorageType::DateTime => write!(f, "DATETIME"),
            StorageType::Varchar(len) => write!(f, "VARCHAR({len})"),
            StorageType::Text => write!(f, "TEXT"),
            StorageType::MediumText => write!(f, "MEDIUMTEXT"),
            StorageType::LongText => write!(f, "LONGTEXT"),
        }
    }
}

impl Serialize for StorageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Analysis Results
// ============================================================================

/// Inferred description of one flattened field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalysis {
    /// Flattened field path (`parent_child`)
    pub name: String,
    /// Resolved logical type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Column type
    pub storage_type: StorageType,
    /// Absent or null in at least one record
    pub nullable: bool,
    /// Longest value in characters, for text columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Total digits, for decimal columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Fractional digits, for decimal columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// First distinct values seen, for display
    pub sample_values: Vec<Value>,
}

/// Schema inferred from a batch of records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAnalysisResult {
    /// Fields sorted by name
    pub fields: Vec<FieldAnalysis>,
    /// Number of fields
    pub total_fields: usize,
    /// Table the records are destined for
    pub table_name: String,
}

impl SchemaAnalysisResult {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldAnalysis> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
