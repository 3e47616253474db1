//! Field map definitions
//!
//! The field map is the externally supplied compilation context: which
//! fields exist, how their values are typed, alias targets, per-field
//! transforms, and the default field unqualified terms match against.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::field_type::FieldType;
use crate::document::Node;

/// Caller-supplied rewrite of a field's value into a query fragment
///
/// A transform replaces the compiler's own leaf construction for its field:
/// whatever it returns is emitted verbatim. Implemented for any
/// `Fn(&str) -> Node`, so closures can be registered directly.
pub trait Transform: Send + Sync {
    /// Produce the query fragment for a normalized value
    fn apply(&self, value: &str) -> Node;
}

impl<F> Transform for F
where
    F: Fn(&str) -> Node + Send + Sync,
{
    fn apply(&self, value: &str) -> Node {
        self(value)
    }
}

/// Compilation context describing the queryable fields
///
/// Built once by the caller (typically from schema introspection) and
/// borrowed immutably by the compiler for the duration of each call.
///
/// # Example
///
/// ```rust
/// use squall::schema::{FieldMap, FieldType};
///
/// let map = FieldMap::new("tags")
///     .field("tags", FieldType::Literal)
///     .field("score", FieldType::Integer)
///     .field("created_at", FieldType::Date)
///     .alias("faved_by", "favourited_by_users");
/// ```
pub struct FieldMap {
    types: HashMap<String, FieldType>,
    aliases: HashMap<String, String>,
    transforms: HashMap<String, Box<dyn Transform>>,
    no_downcase: HashSet<String>,
    nested: HashMap<String, String>,
    default_field: String,
}

impl FieldMap {
    /// Create a field map with the given default field
    ///
    /// Unqualified terms, and fielded terms whose field is not declared,
    /// are matched against the default field.
    pub fn new(default_field: impl Into<String>) -> Self {
        Self {
            types: HashMap::new(),
            aliases: HashMap::new(),
            transforms: HashMap::new(),
            no_downcase: HashSet::new(),
            nested: HashMap::new(),
            default_field: default_field.into(),
        }
    }

    /// Declare a field with its type
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.types.insert(name.into(), field_type);
        self
    }

    /// Declare an alias: queries against `name` are rewritten to `canonical`
    pub fn alias(mut self, name: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), canonical.into());
        self
    }

    /// Register a transform for a canonical field name
    pub fn transform(mut self, name: impl Into<String>, transform: impl Transform + 'static) -> Self {
        self.transforms.insert(name.into(), Box::new(transform));
        self
    }

    /// Exempt a field from value downcasing
    pub fn no_downcase(mut self, name: impl Into<String>) -> Self {
        self.no_downcase.insert(name.into());
        self
    }

    /// Declare a field as a nested sub-field of a parent document path
    pub fn nested(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.nested.insert(name.into(), path.into());
        self
    }

    /// The field unqualified terms match against
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Declared type of a field, following its alias if the name itself is
    /// not declared
    pub fn type_of(&self, name: &str) -> Option<FieldType> {
        if let Some(ty) = self.types.get(name) {
            return Some(*ty);
        }
        self.aliases.get(name).and_then(|c| self.types.get(c)).copied()
    }

    /// Canonical name for a field (itself when no alias is declared)
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Transform registered for a canonical field name
    pub fn transform_of(&self, name: &str) -> Option<&dyn Transform> {
        self.transforms.get(name).map(Box::as_ref)
    }

    /// Check if a field keeps its value's original case
    pub fn keeps_case(&self, name: &str) -> bool {
        self.no_downcase.contains(name)
    }

    /// Nested parent path for a canonical field name, if declared nested
    pub fn nested_path(&self, name: &str) -> Option<&str> {
        self.nested.get(name).map(String::as_str)
    }
}

impl fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMap")
            .field("types", &self.types)
            .field("aliases", &self.aliases)
            .field("transforms", &self.transforms.len())
            .field("no_downcase", &self.no_downcase)
            .field("nested", &self.nested)
            .field("default_field", &self.default_field)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Scalar;

    #[test]
    fn test_type_lookup_follows_alias() {
        let map = FieldMap::new("tags")
            .field("favourited_by_users", FieldType::Literal)
            .alias("faved_by", "favourited_by_users");

        assert_eq!(map.type_of("faved_by"), Some(FieldType::Literal));
        assert_eq!(map.canonical("faved_by"), "favourited_by_users");
        assert_eq!(map.type_of("unknown"), None);
    }

    #[test]
    fn test_declared_name_wins_over_alias() {
        let map = FieldMap::new("tags")
            .field("width", FieldType::Integer)
            .alias("width", "image_width");

        // A direct declaration takes precedence over the alias target.
        assert_eq!(map.type_of("width"), Some(FieldType::Integer));
    }

    #[test]
    fn test_transform_registration() {
        let map = FieldMap::new("tags").transform("my", |value: &str| {
            Node::term("watcher_ids", Scalar::Str(value.to_string()), None)
        });

        let out = map.transform_of("my").unwrap().apply("watched");
        assert_eq!(
            out,
            Node::term("watcher_ids", Scalar::Str("watched".to_string()), None)
        );
        assert!(map.transform_of("tags").is_none());
    }

    #[test]
    fn test_no_downcase() {
        let map = FieldMap::new("tags").no_downcase("sha512_hash");
        assert!(map.keeps_case("sha512_hash"));
        assert!(!map.keeps_case("tags"));
    }
}
