//! Storage type mapping
//!
//! Maps a resolved field type and its observed sizes to a column type.
//! First matching rule wins.

use super::types::{FieldType, StorageType};

/// Largest precision a decimal column accepts
pub const MAX_DECIMAL_PRECISION: u32 = 65;
/// Largest scale a decimal column accepts
pub const MAX_DECIMAL_SCALE: u32 = 30;
/// Decimal column used when no precision was observed
pub const DEFAULT_DECIMAL: StorageType = StorageType::Decimal {
    precision: 10,
    scale: 2,
};

/// Longest value kept in a `VARCHAR(255)`
pub const SHORT_TEXT_LIMIT: usize = 255;
/// Longest value kept in a `TEXT`
pub const TEXT_LIMIT: usize = 65_535;
/// Longest value kept in a `MEDIUMTEXT`
pub const MEDIUM_TEXT_LIMIT: usize = 16_777_215;

/// Observed sizes that feed the mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedSize {
    /// Longest value in characters
    pub max_length: usize,
    /// Total digits, already capped
    pub precision: u32,
    /// Fractional digits, already capped
    pub scale: u32,
}

/// Column type for a field
pub fn storage_type_for(field_type: FieldType, size: ObservedSize) -> StorageType {
    match field_type {
        FieldType::Boolean => StorageType::Boolean,
        FieldType::Integer => StorageType::BigInt,
        FieldType::Number => decimal(size.precision, size.scale),
        FieldType::Date => StorageType::DateTime,
        FieldType::Email | FieldType::Url => {
            let len = size.max_length.max(SHORT_TEXT_LIMIT);
            if len > TEXT_LIMIT {
                StorageType::Text
            } else {
                StorageType::Varchar(len as u32)
            }
        }
        FieldType::String => text_tier(size.max_length),
        FieldType::Unknown => StorageType::Text,
    }
}

/// Cap precision and scale to what a decimal column accepts
pub fn cap_decimal(precision: u32, scale: u32) -> (u32, u32) {
    let scale = scale.min(MAX_DECIMAL_SCALE);
    let precision = precision.min(MAX_DECIMAL_PRECISION).max(scale + 1);
    (precision, scale)
}

fn decimal(precision: u32, scale: u32) -> StorageType {
    if precision == 0 {
        return DEFAULT_DECIMAL;
    }
    let (precision, scale) = cap_decimal(precision, scale);
    StorageType::Decimal { precision, scale }
}

fn text_tier(max_length: usize) -> StorageType {
    if max_length <= SHORT_TEXT_LIMIT {
        StorageType::Varchar(SHORT_TEXT_LIMIT as u32)
    } else if max_length <= TEXT_LIMIT {
        StorageType::Text
    } else if max_length <= MEDIUM_TEXT_LIMIT {
        StorageType::MediumText
    } else {
        StorageType::LongText
    }
}
