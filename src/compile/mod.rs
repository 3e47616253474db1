//! Query string compilation pipeline
//!
//! Translates a human-friendly query string into a structured query
//! document in three stages:
//!
//! 1. the [`lexer`] tokenizes the source into a postfix stream via a
//!    shunting-yard walk;
//! 2. the term analyzer interprets each atom against the caller's
//!    [`FieldMap`]: field routing, value typing, modifiers;
//! 3. the parser folds the stream into a boolean tree, flattening
//!    associative operators and collapsing double negation on groups.
//!
//! # Syntax
//!
//! ```text
//! rarity, sci-twi              AND (also `&&`, `AND`)
//! cute || adorable             OR  (also `OR`)
//! !seapony, -seapony, NOT ...  prefix NOT
//! (a || b) && c                grouping
//! "pinkie (cosplay)"           quoted literal
//! score.gte:100                fielded term with range suffix
//! created_at:3 days ago        date range
//! flutter*                     wildcard
//! "lyra hortstrings"~0.9       fuzzy match
//! rarity^2                     boost
//! ```
//!
//! # Example
//!
//! ```rust
//! use squall::compile::QueryCompiler;
//! use squall::schema::{FieldMap, FieldType};
//!
//! let meta = FieldMap::new("tags").field("score", FieldType::Integer);
//! let compiled = QueryCompiler::new(&meta).compile("score.gt:100").unwrap();
//! assert!(!compiled.requires_query);
//! ```

pub mod lexer;

mod date;
mod parser;
mod term;

use chrono::Utc;
use tracing::{debug, trace};

use crate::document::Node;
use crate::error::Result;
use crate::schema::FieldMap;
use term::TermAnalyzer;

/// A compiled query document
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Root of the query tree
    pub query: Node,
    /// True when the tree contains a wildcard, fuzzy, boosted, or
    /// full-text leaf
    ///
    /// Signals the caller to embed the document as a scoring query rather
    /// than a filter.
    pub requires_query: bool,
}

/// Compiler for query strings against one field map
///
/// Stateless between calls: the field map is borrowed immutably for each
/// compilation, so compilers can be shared across threads freely.
pub struct QueryCompiler<'a> {
    meta: &'a FieldMap,
}

impl<'a> QueryCompiler<'a> {
    /// Create a compiler over the given field map
    pub fn new(meta: &'a FieldMap) -> Self {
        Self { meta }
    }

    /// Compile a query string into a query document
    ///
    /// Empty or whitespace-only input compiles to `match_none`. The
    /// relative-date origin is captured once per call, so every date
    /// literal in the query resolves against the same instant.
    pub fn compile(&self, source: &str) -> Result<CompiledQuery> {
        debug!(source, "compiling query string");
        let tokens = lexer::lex(source)?;
        trace!(tokens = tokens.len(), "lexed postfix stream");

        let analyzer = TermAnalyzer::new(self.meta, Utc::now());
        let (query, requires_query) = parser::fold(&tokens, &analyzer)?;
        trace!(requires_query, "folded query tree");

        Ok(CompiledQuery {
            query,
            requires_query,
        })
    }
}

/// Compile a query string in one call
pub fn compile(source: &str, meta: &FieldMap) -> Result<CompiledQuery> {
    QueryCompiler::new(meta).compile(source)
}
