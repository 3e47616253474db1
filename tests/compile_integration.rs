//! Integration tests for query string compilation
//!
//! Tests the full pipeline from source string to serialized query
//! document, including the structural invariants the parser guarantees.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use squall::document::Scalar;
use squall::{compile, FieldMap, FieldType, LexError, Node, ParseError, ValueError};

fn meta() -> FieldMap {
    FieldMap::new("t.name")
        .field("t.name", FieldType::Literal)
        .field("description", FieldType::FullText)
        .field("score", FieldType::Integer)
        .field("created_at", FieldType::Date)
        .field("hidden", FieldType::Boolean)
}

fn doc(input: &str) -> Value {
    compile(input, &meta()).unwrap().query.to_value()
}

fn term(value: &str) -> Value {
    json!({ "term": { "t.name": value } })
}

fn ts(year: i32, month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .unwrap()
        .timestamp()
}

#[test]
fn test_empty_input_is_match_none() {
    assert_eq!(doc(""), json!({ "match_none": {} }));
    assert_eq!(doc("   "), json!({ "match_none": {} }));
    assert!(!compile("", &meta()).unwrap().requires_query);
}

#[test]
fn test_bare_term_with_spaces() {
    assert_eq!(doc("twilight sparkle"), term("twilight sparkle"));
}

#[test]
fn test_comma_conjunction() {
    assert_eq!(
        doc("twilight sparkle,starlight glimmer"),
        json!({ "bool": { "must": [
            term("twilight sparkle"),
            term("starlight glimmer")
        ] } })
    );
}

#[test]
fn test_negated_group_conjunction() {
    assert_eq!(
        doc("!(pinkie pie || twilight sparkle) && rarity"),
        json!({ "bool": { "must": [
            { "bool": { "must_not": [
                { "bool": { "should": [
                    term("pinkie pie"),
                    term("twilight sparkle")
                ] } }
            ] } },
            term("rarity")
        ] } })
    );
}

#[test]
fn test_integer_range_suffix() {
    assert_eq!(
        doc("score.gt:100"),
        json!({ "range": { "score": { "gt": 100 } } })
    );
}

#[test]
fn test_date_year_range() {
    assert_eq!(
        doc("created_at:2015"),
        json!({ "range": { "created_at": {
            "gte": ts(2015, 1, 1),
            "lt": ts(2016, 1, 1)
        } } })
    );
}

#[test]
fn test_fuzzy_phrase() {
    let compiled = compile("\"lyra hortstrings\"~0.9", &meta()).unwrap();
    assert_eq!(
        compiled.query.to_value(),
        json!({ "fuzzy": { "t.name": {
            "value": "lyra hortstrings",
            "fuzziness": 0.9
        } } })
    );
    assert!(compiled.requires_query);
}

#[test]
fn test_whitespace_invariance_around_operators() {
    let expected = doc("a && b");
    assert_eq!(doc("a&&b"), expected);
    assert_eq!(doc("a  &&  b"), expected);
    assert_eq!(doc("a,b"), expected);
    assert_eq!(doc("a , b"), expected);
    assert_eq!(doc("a AND b"), expected);
}

#[test]
fn test_redundant_parens_are_invisible() {
    assert_eq!(doc("(a)"), doc("a"));
    assert_eq!(doc("((a || b))"), doc("a || b"));
    assert_eq!(doc("(a && b) && c"), doc("a && b && c"));
    assert_eq!(doc("a && (b && c)"), doc("a && b && c"));
}

#[test]
fn test_associativity_flattening() {
    assert_eq!(
        doc("a && b && c"),
        json!({ "bool": { "must": [term("a"), term("b"), term("c")] } })
    );
    assert_eq!(
        doc("a || b || c"),
        json!({ "bool": { "should": [term("a"), term("b"), term("c")] } })
    );
}

#[test]
fn test_double_negation_on_group_collapses() {
    assert_eq!(
        doc("!!(a || b)"),
        json!({ "bool": { "must": [
            { "bool": { "should": [term("a"), term("b")] } }
        ] } })
    );
}

#[test]
fn test_chained_not_on_bare_term_stacks() {
    assert_eq!(
        doc("!!!flutterbat"),
        json!({ "bool": { "must_not": [
            { "bool": { "must_not": [
                { "bool": { "must_not": [term("flutterbat")] } }
            ] } }
        ] } })
    );
}

#[test]
fn test_implicit_literal_fallback() {
    assert_eq!(doc("artist:k-anon"), term("artist:k-anon"));
}

#[test]
fn test_mixed_precedence() {
    assert_eq!(
        doc("a || b && c"),
        json!({ "bool": { "should": [
            term("a"),
            { "bool": { "must": [term("b"), term("c")] } }
        ] } })
    );
}

#[test]
fn test_requires_query_tracks_scoring_leaves() {
    let cases = [
        ("rarity", false),
        ("score.gt:10 && hidden:false", false),
        ("flutter*", true),
        ("rarity^2 && a", true),
        ("description:cute pony", true),
        ("\"derpy\"~0.7", true),
    ];
    for (input, expected) in cases {
        let compiled = compile(input, &meta()).unwrap();
        assert_eq!(
            compiled.requires_query, expected,
            "requires_query mismatch for {input:?}"
        );
    }
}

#[test]
fn test_requires_query_matches_tree_content() {
    // The flag is equivalent to the serialized tree containing a scoring
    // construct.
    for input in [
        "rarity",
        "flutter*",
        "a && !b",
        "description:best pony || score.lte:5",
        "\"luna\"~0.9^2",
        "!!!flutterbat",
    ] {
        let compiled = compile(input, &meta()).unwrap();
        let text = compiled.query.to_value().to_string();
        let scoring = text.contains("wildcard")
            || text.contains("fuzzy")
            || text.contains("match_phrase")
            || text.contains("boost");
        assert_eq!(compiled.requires_query, scoring, "mismatch for {input:?}");
    }
}

#[test]
fn test_quoted_operators_stay_literal() {
    assert_eq!(doc("\"a AND b\""), term("a and b"));
}

#[test]
fn test_embedded_parens_preserved() {
    assert_eq!(doc("pinkie pie (cosplayer)"), term("pinkie pie (cosplayer)"));
}

#[test]
fn test_lex_errors_are_fatal() {
    assert_eq!(
        compile("(a && b", &meta()).unwrap_err(),
        LexError::UnmatchedParen.into()
    );
    assert_eq!(
        compile("a)", &meta()).unwrap_err(),
        LexError::UnmatchedParen.into()
    );
}

#[test]
fn test_parse_errors_are_fatal() {
    assert_eq!(
        compile("a &&", &meta()).unwrap_err(),
        ParseError::MissingOperand.into()
    );
    assert_eq!(
        compile("(a) (b)", &meta()).unwrap_err(),
        ParseError::MissingOperator.into()
    );
}

#[test]
fn test_value_errors_name_field_and_value() {
    let err = compile("score:over9000 && a", &meta()).unwrap_err();
    assert_eq!(
        err,
        ValueError::BadInteger {
            field: "score".to_string(),
            value: "over9000".to_string()
        }
        .into()
    );
    assert_eq!(
        err.to_string(),
        "field 'score' expects an integer, got 'over9000'"
    );
}

#[test]
fn test_transform_integration() {
    let meta = meta().field("my", FieldType::Literal).transform(
        "my",
        |value: &str| match value {
            "faves" => Node::term("fave_ids", Scalar::Int(42), None),
            other => Node::term("t.name", Scalar::Str(other.to_string()), None),
        },
    );
    let compiled = compile("my:faves && rarity", &meta).unwrap();
    assert_eq!(
        compiled.query.to_value(),
        json!({ "bool": { "must": [
            { "term": { "fave_ids": 42 } },
            { "term": { "t.name": "rarity" } }
        ] } })
    );
}

#[test]
fn test_nested_field_integration() {
    let meta = meta()
        .field("comments.author", FieldType::Literal)
        .nested("comments.author", "comments");
    assert_eq!(
        compile("comments.author:pabbley", &meta).unwrap().query.to_value(),
        json!({ "nested": {
            "path": "comments",
            "query": { "term": { "comments.author": "pabbley" } }
        } })
    );
}

#[test]
fn test_no_empty_bool_arrays_serialized() {
    for input in ["a && b", "!a", "!!(a || b)", "!(a && b) || c"] {
        let text = doc(input).to_string();
        assert!(
            !text.contains("[]"),
            "empty clause list serialized for {input:?}: {text}"
        );
    }
}

#[test]
fn test_star_matches_all() {
    assert_eq!(doc("*"), json!({ "match_all": {} }));
}
