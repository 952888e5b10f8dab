#![allow(dead_code)]
//! Shared helpers for `post-query` integration tests.

use post_query::*;

/// A full image-board vocabulary.
pub const METATAGS: &[&str] = &[
    "user", "approver", "commenter", "comm", "noter", "noteupdater", "artcomm",
    "commentaryupdater", "flagger", "appealer", "upvote", "downvote", "fav",
    "ordfav", "favgroup", "ordfavgroup", "pool", "ordpool", "note", "comment",
    "commentary", "id", "rating", "source", "status", "filetype", "disapproved",
    "parent", "child", "search", "embedded", "md5", "pixelhash", "width",
    "height", "mpixels", "ratio", "views", "score", "upvotes", "downvotes",
    "favcount", "filesize", "date", "age", "order", "limit", "tagcount",
    "pixiv_id", "pixiv", "unaliased", "exif", "duration", "random", "is", "has",
    "ai", "updater", "metadataupdater", "modelhash", "comment_count",
    "deleted_comment_count", "active_comment_count", "note_count",
    "deleted_note_count", "active_note_count", "flag_count", "child_count",
    "deleted_child_count", "active_child_count", "pool_count",
    "deleted_pool_count", "active_pool_count", "series_pool_count",
    "collection_pool_count", "appeal_count", "approval_count",
    "replacement_count", "comments", "deleted_comments", "active_comments",
    "notes", "deleted_notes", "active_notes", "flags", "children",
    "deleted_children", "active_children", "pools", "deleted_pools",
    "active_pools", "series_pools", "collection_pools", "appeals", "approvals",
    "replacements", "arttags", "copytags", "chartags", "gentags", "metatags",
];

pub fn parse_ok(input: &str) -> Query {
    match parse(input, METATAGS) {
        Ok(query) => query,
        Err(err) => panic!("failed to parse {input:?}: {err}"),
    }
}

pub fn parse_err(input: &str) -> ParseError {
    match parse(input, METATAGS) {
        Ok(query) => panic!("expected {input:?} to fail, got: {query:?}"),
        Err(err) => err,
    }
}

/// Children of the root conjunction.
pub fn terms(input: &str) -> Vec<QueryNode> {
    parse_ok(input).terms().to_vec()
}

/// The single top-level term of `input`.
pub fn single(input: &str) -> QueryNode {
    let mut terms = terms(input);
    assert_eq!(terms.len(), 1, "expected one term in {input:?}: {terms:?}");
    terms.remove(0)
}

pub fn as_and(node: &QueryNode) -> &Vec<QueryNode> {
    match node {
        QueryNode::And(parts) => parts,
        other => panic!("expected And, got: {other:?}"),
    }
}

pub fn as_or(node: &QueryNode) -> &Vec<QueryNode> {
    match node {
        QueryNode::Or(parts) => parts,
        other => panic!("expected Or, got: {other:?}"),
    }
}

pub fn as_not(node: &QueryNode) -> &QueryNode {
    match node {
        QueryNode::Not(inner) => inner,
        other => panic!("expected Not, got: {other:?}"),
    }
}

pub fn as_group(node: &QueryNode) -> &QueryNode {
    match node {
        QueryNode::Group(inner) => inner,
        other => panic!("expected Group, got: {other:?}"),
    }
}

pub fn as_metatag(node: &QueryNode) -> &Metatag {
    match node {
        QueryNode::Metatag(metatag) => metatag,
        other => panic!("expected Metatag, got: {other:?}"),
    }
}

pub fn tag_is(node: &QueryNode, expected: &str) {
    match node {
        QueryNode::Tag {
            name,
            wildcard: false,
        } => assert_eq!(name, expected),
        other => panic!("expected Tag({expected}), got: {other:?}"),
    }
}

pub fn wildcard_is(node: &QueryNode, expected: &str) {
    match node {
        QueryNode::Tag {
            name,
            wildcard: true,
        } => assert_eq!(name, expected),
        other => panic!("expected wildcard Tag({expected}), got: {other:?}"),
    }
}

pub fn metatag_is(node: &QueryNode, name: &str, value: &str) {
    let metatag = as_metatag(node);
    assert_eq!(metatag.name, name);
    assert_eq!(metatag.value, value);
}

pub fn comparison_is(node: &QueryNode, op: Comparator, operand: &str) {
    match &as_metatag(node).comparison {
        Some(Comparison::Compare { op: o, operand: v }) => {
            assert_eq!(*o, op);
            assert_eq!(v, operand);
        }
        other => panic!("expected Compare, got: {other:?}"),
    }
}

pub fn range_is(node: &QueryNode, start: Option<&str>, end: Option<&str>, bound: RangeBound) {
    match &as_metatag(node).comparison {
        Some(Comparison::Range {
            start: s,
            end: e,
            bound: b,
        }) => {
            assert_eq!(s.as_deref(), start);
            assert_eq!(e.as_deref(), end);
            assert_eq!(*b, bound);
        }
        other => panic!("expected Range, got: {other:?}"),
    }
}
