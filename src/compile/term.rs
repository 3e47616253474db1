//! Term analysis
//!
//! Interprets one atom from the lexer: splits the field prefix, routes by
//! the field's declared type, validates and normalizes the value, applies
//! aliases and caller transforms, and emits the leaf query fragment plus
//! the flags that decide scoring-query placement.

use std::net::IpAddr;

use chrono::{DateTime, Utc};

use super::date;
use super::lexer::Atom;
use crate::document::{Node, RangeBounds, RangeValue, Scalar};
use crate::error::{Result, ValueError};
use crate::schema::{FieldMap, FieldType};

/// Per-leaf properties that force the document into the scoring-query
/// slot of the search request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LeafFlags {
    pub wildcarded: bool,
    pub fuzzy: bool,
    pub boosted: bool,
    pub ngram: bool,
}

impl LeafFlags {
    pub fn any(&self) -> bool {
        self.wildcarded || self.fuzzy || self.boosted || self.ngram
    }
}

/// An analyzed atom: the leaf fragment and its flags
#[derive(Debug)]
pub(crate) struct AnalyzedTerm {
    pub node: Node,
    pub flags: LeafFlags,
}

/// Range operator parsed from a `field.<op>:` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl RangeOp {
    fn parse(suffix: &str) -> Option<RangeOp> {
        match suffix {
            "gt" => Some(RangeOp::Gt),
            "gte" => Some(RangeOp::Gte),
            "lt" => Some(RangeOp::Lt),
            "lte" => Some(RangeOp::Lte),
            "eq" => Some(RangeOp::Eq),
            _ => None,
        }
    }
}

/// Validated value, ready for leaf construction
#[derive(Debug)]
enum Typed {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Bounds(RangeBounds),
}

/// Analyzer for the atoms of one compilation
///
/// Borrows the field map and carries the relative-date origin so every
/// date literal in the query resolves against the same instant.
pub(crate) struct TermAnalyzer<'a> {
    meta: &'a FieldMap,
    now: DateTime<Utc>,
}

impl<'a> TermAnalyzer<'a> {
    pub fn new(meta: &'a FieldMap, now: DateTime<Utc>) -> Self {
        Self { meta, now }
    }

    /// Analyze one atom into a leaf fragment
    pub fn analyze(&self, atom: &Atom) -> Result<AnalyzedTerm> {
        let (text, quoted) = strip_quotes(&atom.text);

        let (mut field, mut value) = match split_field(text) {
            Some((field, value)) => (field.to_lowercase(), value),
            None => (self.meta.default_field().to_string(), text),
        };

        // `<name>.<op>` range suffix, honored only for rangeable fields.
        let mut range_op = None;
        if let Some((base, suffix)) = field.rsplit_once('.') {
            if let Some(op) = RangeOp::parse(suffix) {
                if self.meta.type_of(base).is_some_and(|ty| ty.supports_range()) {
                    range_op = Some(op);
                    field = base.to_string();
                }
            }
        }

        // Unknown fields never error: the colon was not a separator, and
        // the whole atom is a value for the default field.
        let field_type = match self.meta.type_of(&field) {
            Some(ty) => ty,
            None => {
                field = self.meta.default_field().to_string();
                value = text;
                range_op = None;
                self.meta.type_of(&field).unwrap_or(FieldType::Literal)
            }
        };

        let normalized = if field_type.downcases() && !self.meta.keeps_case(&field) {
            value.to_lowercase()
        } else if field_type.downcases() {
            value.to_string()
        } else {
            value.trim().to_string()
        };

        let typed = self.validate(&field, field_type, &normalized, range_op, atom.fuzz)?;

        let canonical = self.meta.canonical(&field).to_string();
        if let Some(transform) = self.meta.transform_of(&canonical) {
            return Ok(AnalyzedTerm {
                node: transform.apply(&normalized),
                flags: LeafFlags::default(),
            });
        }

        let mut flags = LeafFlags::default();
        let node = self.build_leaf(
            &canonical,
            field_type,
            typed,
            atom,
            quoted,
            &mut flags,
        );
        let node = match self.meta.nested_path(&canonical) {
            Some(path) => Node::nested(path, node),
            None => node,
        };

        Ok(AnalyzedTerm { node, flags })
    }

    /// Validate the normalized value against the field type, producing
    /// either a scalar or range-shaped bounds
    fn validate(
        &self,
        field: &str,
        field_type: FieldType,
        value: &str,
        range_op: Option<RangeOp>,
        fuzz: Option<f64>,
    ) -> Result<Typed> {
        let typed = match field_type {
            FieldType::Literal | FieldType::FullText => Typed::Text(value.to_string()),
            FieldType::Boolean => match value {
                "true" => Typed::Bool(true),
                "false" => Typed::Bool(false),
                _ => return Err(bad(field, value, ValueKind::Boolean)),
            },
            FieldType::Integer => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| bad(field, value, ValueKind::Integer))?;
                match (range_op, fuzz) {
                    (Some(op), _) => Typed::Bounds(numeric_bounds(op, RangeValue::Int(parsed))),
                    (None, Some(fuzz)) => {
                        let spread = fuzz.trunc() as i64;
                        Typed::Bounds(RangeBounds {
                            gte: Some(RangeValue::Int(parsed.saturating_sub(spread))),
                            lte: Some(RangeValue::Int(parsed.saturating_add(spread))),
                            ..Default::default()
                        })
                    }
                    (None, None) => Typed::Int(parsed),
                }
            }
            FieldType::Float => {
                // Finite only: the engine JSON has no encoding for NaN or
                // infinities.
                let parsed: f64 = value
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or_else(|| bad(field, value, ValueKind::Float))?;
                match (range_op, fuzz) {
                    (Some(op), _) => Typed::Bounds(numeric_bounds(op, RangeValue::Float(parsed))),
                    (None, Some(fuzz)) => Typed::Bounds(RangeBounds {
                        gte: Some(RangeValue::Float(parsed - fuzz)),
                        lte: Some(RangeValue::Float(parsed + fuzz)),
                        ..Default::default()
                    }),
                    (None, None) => Typed::Float(parsed),
                }
            }
            FieldType::Ip => {
                if !valid_ip_or_cidr(value) {
                    return Err(bad(field, value, ValueKind::Ip));
                }
                Typed::Text(value.to_string())
            }
            FieldType::Date => {
                let (start, end) = date::parse_range(value, self.now)
                    .ok_or_else(|| bad(field, value, ValueKind::Date))?;
                Typed::Bounds(date_bounds(range_op, start, end))
            }
        };
        Ok(typed)
    }

    fn build_leaf(
        &self,
        field: &str,
        field_type: FieldType,
        typed: Typed,
        atom: &Atom,
        quoted: bool,
        flags: &mut LeafFlags,
    ) -> Node {
        let boost = atom.boost;
        match typed {
            // Ranges carry no boost; the engine scores them as filters.
            Typed::Bounds(bounds) => Node::range(field, bounds),
            Typed::Bool(value) => {
                flags.boosted = boost.is_some();
                Node::term(field, Scalar::Bool(value), boost)
            }
            Typed::Int(value) => {
                flags.boosted = boost.is_some();
                Node::term(field, Scalar::Int(value), boost)
            }
            Typed::Float(value) => {
                flags.boosted = boost.is_some();
                Node::term(field, Scalar::Float(value), boost)
            }
            Typed::Text(value) => {
                if field_type == FieldType::Ip {
                    flags.boosted = boost.is_some();
                    return Node::term(field, Scalar::Str(value), boost);
                }
                if let Some(fuzziness) = atom.fuzz {
                    flags.fuzzy = true;
                    flags.boosted = boost.is_some();
                    return Node::fuzzy(field, strip_escapes(&value), fuzziness, boost);
                }
                // Wildcards only apply outside quotes; quoted
                // metacharacters match literally.
                if !quoted && contains_unescaped_wildcard(&value) {
                    if value == "*" {
                        return Node::match_all();
                    }
                    flags.wildcarded = true;
                    flags.boosted = boost.is_some();
                    return Node::wildcard(field, keep_wildcard_escapes(&value), boost);
                }
                if field_type.is_full_text() {
                    flags.ngram = true;
                    flags.boosted = boost.is_some();
                    return Node::match_phrase(field, strip_escapes(&value), boost);
                }
                flags.boosted = boost.is_some();
                Node::term(field, Scalar::Str(strip_escapes(&value)), boost)
            }
        }
    }
}

enum ValueKind {
    Integer,
    Float,
    Boolean,
    Ip,
    Date,
}

fn bad(field: &str, value: &str, kind: ValueKind) -> crate::error::SquallError {
    let field = field.to_string();
    let value = value.to_string();
    let err = match kind {
        ValueKind::Integer => ValueError::BadInteger { field, value },
        ValueKind::Float => ValueError::BadFloat { field, value },
        ValueKind::Boolean => ValueError::BadBoolean { field, value },
        ValueKind::Ip => ValueError::BadIp { field, value },
        ValueKind::Date => ValueError::BadDate { field, value },
    };
    err.into()
}

fn numeric_bounds(op: RangeOp, value: RangeValue) -> RangeBounds {
    let mut bounds = RangeBounds::default();
    match op {
        RangeOp::Gt => bounds.gt = Some(value),
        RangeOp::Gte => bounds.gte = Some(value),
        RangeOp::Lt => bounds.lt = Some(value),
        RangeOp::Lte => bounds.lte = Some(value),
        RangeOp::Eq => {
            bounds.gte = Some(value);
            bounds.lte = Some(value);
        }
    }
    bounds
}

/// Map a date's `(range_start, range_end)` span through the range suffix
///
/// The suffixless (and `.eq`) form covers the span; `.lt` and `.gte` cut
/// at the span's start, `.lte` and `.gt` at its end.
fn date_bounds(op: Option<RangeOp>, start: i64, end: i64) -> RangeBounds {
    let mut bounds = RangeBounds::default();
    match op {
        None | Some(RangeOp::Eq) => {
            bounds.gte = Some(RangeValue::Timestamp(start));
            bounds.lt = Some(RangeValue::Timestamp(end));
        }
        Some(RangeOp::Lt) => bounds.lt = Some(RangeValue::Timestamp(start)),
        Some(RangeOp::Gte) => bounds.gte = Some(RangeValue::Timestamp(start)),
        Some(RangeOp::Lte) => bounds.lt = Some(RangeValue::Timestamp(end)),
        Some(RangeOp::Gt) => bounds.gte = Some(RangeValue::Timestamp(end)),
    }
    bounds
}

/// Strip a fully wrapping pair of unescaped quotes
fn strip_quotes(text: &str) -> (&str, bool) {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') && !ends_escaped(text) {
        (&text[1..text.len() - 1], true)
    } else {
        (text, false)
    }
}

/// Check whether the final character is escaped by a backslash run
fn ends_escaped(text: &str) -> bool {
    text.as_bytes()[..text.len() - 1]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count()
        % 2
        == 1
}

/// Split `field:value` at the leftmost unescaped colon
///
/// The colon needs at least one character before it; a leading colon is
/// plain value text.
fn split_field(text: &str) -> Option<(&str, &str)> {
    let mut prev = None;
    for (i, ch) in text.char_indices() {
        if ch == ':' && i > 0 && prev != Some('\\') {
            return Some((&text[..i], &text[i + 1..]));
        }
        prev = Some(ch);
    }
    None
}

fn contains_unescaped_wildcard(value: &str) -> bool {
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '*' | '?' => return true,
            _ => {}
        }
    }
    false
}

/// Remove every backslash escape
fn strip_escapes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Remove backslash escapes except `\*` and `\?`, which the engine needs
fn keep_wildcard_escapes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next @ ('*' | '?')) => {
                    out.push('\\');
                    out.push(next);
                }
                Some(next) => out.push(next),
                None => {}
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn valid_ip_or_cidr(value: &str) -> bool {
    match value.split_once('/') {
        None => value.parse::<IpAddr>().is_ok(),
        Some((addr, prefix)) => {
            let Ok(addr) = addr.parse::<IpAddr>() else {
                return false;
            };
            let Ok(prefix) = prefix.parse::<u8>() else {
                return false;
            };
            match addr {
                IpAddr::V4(_) => prefix <= 32,
                IpAddr::V6(_) => prefix <= 128,
            }
        }
    }
}
