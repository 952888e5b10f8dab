use crate::ast::{Query, QueryNode};

/// Rewrites a parsed query into the canonical shape backends evaluate.
///
/// Parsing keeps the tree close to what the user typed. Normalizing:
/// - Drops `Group` nodes, since precedence is already encoded in the tree.
/// - Flattens nested conjunctions and disjunctions and unwraps single-child
///   ones. The root stays a conjunction.
/// - Cancels double negation.
/// - Moves metatags behind plain terms inside every conjunction, keeping the
///   relative order of both.
///
/// A new tree is returned, so callers that still need the parsed form can
/// clone before normalizing.
///
/// ```
/// use post_query::{normalize_query, parse};
///
/// let query = parse("user:alice (cat (dog))", ["user"]).unwrap();
/// assert_eq!(normalize_query(query).to_sexp(), "(and cat dog user:alice)");
/// ```
pub fn normalize_query(query: Query) -> Query {
    let root = match normalize_node(query.root) {
        node @ QueryNode::And(_) => node,
        other => QueryNode::And(vec![other]),
    };
    Query { root }
}

fn normalize_node(node: QueryNode) -> QueryNode {
    match node {
        QueryNode::Group(inner) => normalize_node(*inner),
        QueryNode::Not(inner) => match normalize_node(*inner) {
            QueryNode::Not(twice) => *twice,
            other => other.negate(),
        },
        QueryNode::And(children) => normalize_and(children),
        QueryNode::Or(children) => normalize_or(children),
        QueryNode::Tag { .. } | QueryNode::Metatag(_) => node,
    }
}

fn normalize_and(children: Vec<QueryNode>) -> QueryNode {
    let mut flattened = Vec::with_capacity(children.len());
    for child in children.into_iter().map(normalize_node) {
        match child {
            QueryNode::And(nested) => flattened.extend(nested),
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        return flattened.remove(0);
    }
    move_metatags_to_tail(&mut flattened);
    QueryNode::And(flattened)
}

fn normalize_or(children: Vec<QueryNode>) -> QueryNode {
    let mut flattened = Vec::with_capacity(children.len());
    for child in children.into_iter().map(normalize_node) {
        match child {
            QueryNode::Or(nested) => flattened.extend(nested),
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        flattened.remove(0)
    } else {
        QueryNode::Or(flattened)
    }
}

/// Reorders metatags to the end of `parts`, preserving the relative order of
/// metatags and of everything else.
fn move_metatags_to_tail(parts: &mut Vec<QueryNode>) {
    let Some(first) = parts.iter().position(QueryNode::is_metatag) else {
        return;
    };
    if parts[first..].iter().all(QueryNode::is_metatag) {
        return;
    }

    let (metatags, mut rest): (Vec<_>, Vec<_>) = parts.drain(..).partition(QueryNode::is_metatag);
    rest.extend(metatags);
    *parts = rest;
}
