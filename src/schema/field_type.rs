//! Field type definitions
//!
//! Declares how a field's values are typed, validated, and matched.

use serde::{Deserialize, Serialize};

/// Field data type
///
/// Determines how a value written against the field is validated and which
/// leaf query the compiler emits for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Exact-match keyword field
    ///
    /// Values are matched verbatim (downcased unless the field opts out).
    /// Supports wildcards.
    Literal,

    /// Full-text field analyzed into n-grams by the downstream engine
    ///
    /// Matching goes through `match_phrase` rather than `term`.
    FullText,

    /// Boolean value, `true` or `false`
    Boolean,

    /// 64-bit signed integer
    ///
    /// Supports range suffixes and fuzz widening.
    Integer,

    /// 64-bit floating point
    Float,

    /// Date/time field
    ///
    /// Values compile to timestamp ranges spanning the smallest unit the
    /// user mentioned.
    Date,

    /// IPv4/IPv6 address or CIDR range
    Ip,
}

impl FieldType {
    /// Check if this field type accepts `.gt`/`.gte`/`.lt`/`.lte`/`.eq`
    /// range suffixes
    pub fn supports_range(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Date)
    }

    /// Check if this field type is matched through the engine's full-text
    /// analysis chain
    pub fn is_full_text(&self) -> bool {
        matches!(self, FieldType::FullText)
    }

    /// Check if values of this field type are downcased before matching
    pub fn downcases(&self) -> bool {
        matches!(self, FieldType::Literal | FieldType::FullText)
    }

    /// Get the type name used in error messages and serialized schemas
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Literal => "literal",
            FieldType::FullText => "full_text",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Ip => "ip",
        }
    }
}
