//! Combinational coverage: many operator and prefix permutations must parse,
//! keep their invariants and survive rendering.

mod common;
use common::*;
use post_query::*;

fn check_invariants(node: &QueryNode) {
    match node {
        QueryNode::Tag { name, .. } => assert!(!name.is_empty()),
        QueryNode::Metatag(metatag) => {
            assert!(METATAGS.contains(&metatag.name.as_str()), "{metatag:?}");
            assert_eq!(metatag.comparison.is_some(), metatag.kind.is_numeric());
        }
        QueryNode::Not(inner) => {
            assert!(!matches!(**inner, QueryNode::Not(_)), "double negation");
            check_invariants(inner);
        }
        QueryNode::Or(parts) => {
            assert!(parts.len() >= 2, "short Or: {parts:?}");
            parts.iter().for_each(check_invariants);
        }
        QueryNode::And(parts) => parts.iter().for_each(check_invariants),
        QueryNode::Group(inner) => check_invariants(inner),
    }
}

#[test]
fn operator_permutation_matrix() {
    let atoms = ["cat", "-dog", "~bird", "user:alice", "score:>5", "(a or b)", "~(c d)", "水*"];
    let joiners = [" ", " and ", " or ", " not ", " and not "];

    let mut count = 0;
    for left in atoms {
        for joiner in joiners {
            for right in atoms {
                let query = format!("{left}{joiner}{right}");
                let parsed = parse_ok(&query);
                assert!(matches!(parsed.root, QueryNode::And(_)), "{query:?}");
                check_invariants(&parsed.root);
                let rendered = parsed.to_infix();
                assert_eq!(parse_ok(&rendered), parsed, "{query:?} -> {rendered:?}");
                count += 1;
            }
        }
    }
    assert_eq!(count, atoms.len() * joiners.len() * atoms.len());
}

#[test]
fn three_way_mixtures() {
    let atoms = ["a", "~b", "-c", "(d)", "rating:s"];
    for x in atoms {
        for y in atoms {
            for z in atoms {
                for query in [
                    format!("{x} {y} {z}"),
                    format!("{x} or {y} {z}"),
                    format!("({x} {y}) or {z}"),
                    format!("-({x} or {y}) ~{z}"),
                ] {
                    let parsed = parse_ok(&query);
                    check_invariants(&parsed.root);
                    let normalized = normalize_query(parsed.clone());
                    check_invariants(&normalized.root);
                    assert_eq!(parse_ok(&parsed.to_infix()), parsed, "{query:?}");
                }
            }
        }
    }
}

#[test]
fn keyword_boundaries_do_not_consume_neighbors() {
    let cases = ["fooANDbar", "orbit", "Oregon", "nothing", "andante", "or_else", "not_found"];
    for query in cases {
        tag_is(&single(query), &query.to_ascii_lowercase());
    }
}

#[test]
fn separators_of_every_kind() {
    let parts = terms("a\tb\nc\r\nd\u{00A0}e\u{2009}f");
    assert_eq!(parts.len(), 6);
}

#[test]
fn broken_inputs_fail_without_panicking() {
    let cases = [
        "(", ")", "((", "))", ")(", "()", "( )", "\"", "\"abc", "abc\\", "\\",
        "or", "and", "not", "not not", "a or", "or a", ":x", "\"\"", "user:",
        "score:", "score:>", "score:abc", "colour:red", "-()", "~()", "(a or)",
        "user:\"unterminated", "a (b or c", "a b) c",
    ];
    for query in cases {
        let err = parse_err(query);
        assert!(err.position() <= query.len(), "{query:?}: {err}");
        assert!(err.to_string().contains("(at byte"), "{query:?}: {err}");
    }
}

#[test]
fn escapes_at_every_position() {
    for (query, expected) in [
        (r"\a", "a"),
        (r"a\ b", "a b"),
        (r"a\\", r"a\"),
        (r"\\a", r"\a"),
        (r"\\", r"\"),
        (r#"\"a"#, "\"a"),
        (r"a\:b\:c", "a:b:c"),
    ] {
        tag_is(&single(query), expected);
    }
}

#[test]
fn quotes_inside_bare_words_are_literal() {
    tag_is(&single("a\"b"), "a\"b");
}

#[test]
fn lexical_errors_are_reported_as_such() {
    assert!(parse_err("\"open").is_lexical());
    assert!(parse_err("trailing\\").is_lexical());
    assert!(!parse_err("(").is_lexical());
    assert!(!parse_err("colour:red").is_lexical());
}
