//! Query document model
//!
//! The compiler's output: a nested, typed tree serializable to the JSON
//! query DSL of an Elasticsearch-style engine. Leaf shapes follow the
//! engine's conventions exactly:
//!
//! ```json
//! { "term": { "tags": "rarity" } }
//! { "term": { "tags": { "value": "rarity", "boost": 2.0 } } }
//! { "range": { "score": { "gt": 100 } } }
//! { "bool": { "must": [ ... ], "must_not": [ ... ] } }
//! ```
//!
//! Date bounds are emitted as epoch-second timestamps, never strings.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Typed scalar for `term` values
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// Typed bound for `range` queries
///
/// `Timestamp` carries epoch seconds; it serializes identically to `Int`
/// but keeps date provenance visible to callers inspecting the tree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RangeValue {
    Int(i64),
    Float(f64),
    Timestamp(i64),
}

/// Bounds of a `range` query
///
/// At least one bound is always set on an emitted range.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RangeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<RangeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<RangeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<RangeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<RangeValue>,
}

impl RangeBounds {
    /// Check if no bound is set
    pub fn is_empty(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

/// A leaf clause keyed by its field name
///
/// Serializes as a single-entry map, `{ <field>: <value> }`, which is how
/// the engine addresses per-field leaves.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldLeaf<V> {
    pub field: String,
    pub value: V,
}

impl<V: Serialize> Serialize for FieldLeaf<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

/// `term` payload: a bare scalar, or `{value, boost}` when boosted
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TermValue {
    Plain(Scalar),
    Scored { value: Scalar, boost: f64 },
}

/// `wildcard` / `match_phrase` payload: a bare string, or `{value, boost}`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatternValue {
    Plain(String),
    Scored { value: String, boost: f64 },
}

/// `fuzzy` payload, always object-shaped
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FuzzyValue {
    pub value: String,
    pub fuzziness: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<f64>,
}

/// `nested` wrapper addressing a sub-document path
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<Node>,
}

/// One of the three clause lists of a `bool` node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolClause {
    Must,
    Should,
    MustNot,
}

/// Boolean combination node
///
/// Empty clause lists are never serialized, and the compiler never emits a
/// `BoolNode` with all three lists empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BoolNode {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Node>,
}

impl BoolNode {
    /// Build a node with a single populated clause
    pub fn of(clause: BoolClause, children: Vec<Node>) -> Self {
        let mut node = BoolNode::default();
        *node.clause_mut(clause) = children;
        node
    }

    /// The clause list when exactly one is populated
    pub fn sole_clause(&self) -> Option<BoolClause> {
        match (
            self.must.is_empty(),
            self.should.is_empty(),
            self.must_not.is_empty(),
        ) {
            (false, true, true) => Some(BoolClause::Must),
            (true, false, true) => Some(BoolClause::Should),
            (true, true, false) => Some(BoolClause::MustNot),
            _ => None,
        }
    }

    /// Consume the node, returning one clause's children
    pub fn into_children(mut self, clause: BoolClause) -> Vec<Node> {
        std::mem::take(self.clause_mut(clause))
    }

    fn clause_mut(&mut self, clause: BoolClause) -> &mut Vec<Node> {
        match clause {
            BoolClause::Must => &mut self.must,
            BoolClause::Should => &mut self.should,
            BoolClause::MustNot => &mut self.must_not,
        }
    }
}

/// Empty object payload for `match_all` / `match_none`
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EmptyClause {}

/// A node of the output query document
///
/// Serializes to the externally tagged engine shape: the variant name in
/// snake_case is the single top-level key.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    MatchAll(EmptyClause),
    MatchNone(EmptyClause),
    Term(FieldLeaf<TermValue>),
    Wildcard(FieldLeaf<PatternValue>),
    Fuzzy(FieldLeaf<FuzzyValue>),
    MatchPhrase(FieldLeaf<PatternValue>),
    Range(FieldLeaf<RangeBounds>),
    Nested(NestedQuery),
    Bool(BoolNode),
}

impl Node {
    /// `{ "match_all": {} }`
    pub fn match_all() -> Node {
        Node::MatchAll(EmptyClause {})
    }

    /// `{ "match_none": {} }`
    pub fn match_none() -> Node {
        Node::MatchNone(EmptyClause {})
    }

    /// Exact term match, optionally boosted
    pub fn term(field: impl Into<String>, value: Scalar, boost: Option<f64>) -> Node {
        let value = match boost {
            Some(boost) => TermValue::Scored { value, boost },
            None => TermValue::Plain(value),
        };
        Node::Term(FieldLeaf {
            field: field.into(),
            value,
        })
    }

    /// Wildcard pattern match (`*` and `?` metacharacters)
    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>, boost: Option<f64>) -> Node {
        Node::Wildcard(FieldLeaf {
            field: field.into(),
            value: pattern_value(pattern.into(), boost),
        })
    }

    /// Fuzzy match with the given fuzziness
    pub fn fuzzy(
        field: impl Into<String>,
        value: impl Into<String>,
        fuzziness: f64,
        boost: Option<f64>,
    ) -> Node {
        Node::Fuzzy(FieldLeaf {
            field: field.into(),
            value: FuzzyValue {
                value: value.into(),
                fuzziness,
                boost,
            },
        })
    }

    /// Full-text phrase match
    pub fn match_phrase(field: impl Into<String>, value: impl Into<String>, boost: Option<f64>) -> Node {
        Node::MatchPhrase(FieldLeaf {
            field: field.into(),
            value: pattern_value(value.into(), boost),
        })
    }

    /// Range query over typed bounds
    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Node {
        Node::Range(FieldLeaf {
            field: field.into(),
            value: bounds,
        })
    }

    /// Wrap a leaf addressed at a nested sub-document
    pub fn nested(path: impl Into<String>, query: Node) -> Node {
        Node::Nested(NestedQuery {
            path: path.into(),
            query: Box::new(query),
        })
    }

    /// Serialize to a `serde_json::Value`
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("query tree serializes to JSON")
    }
}

fn pattern_value(value: String, boost: Option<f64>) -> PatternValue {
    match boost {
        Some(boost) => PatternValue::Scored { value, boost },
        None => PatternValue::Plain(value),
    }
}
