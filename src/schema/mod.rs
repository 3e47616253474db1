//! Schema and field type system
//!
//! This module defines the compilation context supplied by the caller:
//! - Field types (Literal, FullText, Boolean, Integer, Float, Date, Ip)
//! - The field map (types, aliases, transforms, nested paths)
//! - Per-field value transforms

mod field_type;
mod mapping;

pub use field_type::FieldType;
pub use mapping::{FieldMap, Transform};
