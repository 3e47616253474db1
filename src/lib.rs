//! Squall compiles human-friendly search query strings into the nested
//! JSON query documents understood by Elasticsearch-style engines.
//!
//! The input syntax supports boolean operators (`AND`/`&&`/`,`,
//! `OR`/`||`, prefix `NOT`/`!`/`-`), parentheses, quoted literals,
//! fielded terms with range suffixes, wildcards, fuzzy matching,
//! boosting, and lenient date expressions. The caller supplies a
//! [`schema::FieldMap`] describing the queryable fields; the compiler
//! returns the query tree plus a flag telling the caller whether the
//! document belongs in the scoring-query slot of the search request.
//!
//! # Example
//!
//! ```rust
//! use squall::{compile, FieldMap, FieldType};
//!
//! let meta = FieldMap::new("tags")
//!     .field("tags", FieldType::Literal)
//!     .field("score", FieldType::Integer);
//!
//! let compiled = compile("(cute || adorable) && score.gte:100", &meta).unwrap();
//! assert_eq!(
//!     compiled.query.to_value(),
//!     serde_json::json!({ "bool": { "must": [
//!         { "bool": { "should": [
//!             { "term": { "tags": "cute" } },
//!             { "term": { "tags": "adorable" } }
//!         ] } },
//!         { "range": { "score": { "gte": 100 } } }
//!     ] } })
//! );
//! assert!(!compiled.requires_query);
//! ```

pub mod compile;
pub mod document;
pub mod error;
pub mod schema;

pub use compile::{compile, CompiledQuery, QueryCompiler};
pub use document::Node;
pub use error::{LexError, ParseError, Result, SquallError, ValueError};
pub use schema::{FieldMap, FieldType, Transform};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
