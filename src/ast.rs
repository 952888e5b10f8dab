//! The query tree produced by a successful parse.

use crate::metatag::{Comparator, Comparison, MetatagKind};
use serde::Serialize;

/// A compiled query. The root is always a conjunction; an empty one matches
/// every post.
///
/// ```
/// use post_query::parse;
///
/// let query = parse("   ", ["user"]).unwrap();
/// assert!(query.is_match_all());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub root: QueryNode,
}

impl Query {
    /// Wraps `node` so the root invariant holds.
    pub fn new(node: QueryNode) -> Self {
        match node {
            QueryNode::And(_) => Query { root: node },
            other => Query {
                root: QueryNode::And(vec![other]),
            },
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(&self.root, QueryNode::And(children) if children.is_empty())
    }

    /// Top-level terms of the root conjunction.
    pub fn terms(&self) -> &[QueryNode] {
        match &self.root {
            QueryNode::And(children) => children,
            other => std::slice::from_ref(other),
        }
    }

    pub fn into_root(self) -> QueryNode {
        self.root
    }
}

/// A node of the query tree.
///
/// `And`/`Or` keep flat vectors in source order; every `Or` has at least two
/// children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNode {
    /// A plain tag, possibly containing `*` wildcards.
    ///
    /// ```
    /// use post_query::{parse, QueryNode};
    /// let query = parse("cat_ears", ["user"]).unwrap();
    /// assert!(matches!(&query.terms()[0], QueryNode::Tag { name, wildcard: false } if name == "cat_ears"));
    /// ```
    Tag { name: String, wildcard: bool },
    /// A recognized `name:value` pair.
    ///
    /// ```
    /// use post_query::{parse, QueryNode};
    /// let query = parse("user:alice", ["user"]).unwrap();
    /// assert!(matches!(&query.terms()[0], QueryNode::Metatag(m) if m.name == "user" && m.value == "alice"));
    /// ```
    Metatag(Metatag),
    /// `-term` or `not term`.
    ///
    /// ```
    /// use post_query::{parse, QueryNode};
    /// let query = parse("-cat", ["user"]).unwrap();
    /// let QueryNode::Not(inner) = &query.terms()[0] else { panic!() };
    /// assert!(matches!(&**inner, QueryNode::Tag { name, .. } if name == "cat"));
    /// ```
    Not(Box<QueryNode>),
    /// `a or b`, or the `~a ~b` optional terms of one conjunction.
    ///
    /// ```
    /// use post_query::{parse, QueryNode};
    /// let query = parse("~cat ~dog", ["user"]).unwrap();
    /// let QueryNode::Or(parts) = &query.terms()[0] else { panic!() };
    /// assert_eq!(parts.len(), 2);
    /// ```
    Or(Vec<QueryNode>),
    /// Terms that must all match.
    ///
    /// ```
    /// use post_query::{parse, QueryNode};
    /// let query = parse("cat dog", ["user"]).unwrap();
    /// let QueryNode::And(parts) = &query.root else { panic!() };
    /// assert_eq!(parts.len(), 2);
    /// ```
    And(Vec<QueryNode>),
    /// Explicit parentheses, kept so the tree mirrors the query text.
    ///
    /// ```
    /// use post_query::{parse, QueryNode};
    /// let query = parse("(cat or dog)", ["user"]).unwrap();
    /// let QueryNode::Group(inner) = &query.terms()[0] else { panic!() };
    /// assert!(matches!(&**inner, QueryNode::Or(parts) if parts.len() == 2));
    /// ```
    Group(Box<QueryNode>),
}

impl QueryNode {
    pub fn tag(name: impl Into<String>) -> Self {
        QueryNode::Tag {
            name: name.into(),
            wildcard: false,
        }
    }

    pub fn negate(self) -> Self {
        QueryNode::Not(Box::new(self))
    }

    pub fn is_metatag(&self) -> bool {
        matches!(self, QueryNode::Metatag(_))
    }

    /// Whether the node renders as a single term without parentheses.
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            QueryNode::Tag { .. } | QueryNode::Metatag(_) | QueryNode::Group(_)
        )
    }
}

/// A metatag with its value checked against the shape its kind demands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metatag {
    /// Lowercased metatag name as written (`comments`, not `comment_count`).
    pub name: String,
    pub kind: MetatagKind,
    /// The value with escapes resolved.
    pub value: String,
    /// Set when the value was quoted or has to be quoted to survive rendering.
    pub quoted: bool,
    /// Present exactly for numeric kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
}

impl Metatag {
    pub fn comparator(&self) -> Option<Comparator> {
        self.comparison.as_ref().map(Comparison::comparator)
    }

    /// The name the backend should look up; count aliases resolve to their
    /// `*_count` metatag.
    pub fn canonical_name(&self) -> &str {
        match self.kind {
            MetatagKind::CountAlias(canonical) => canonical,
            _ => &self.name,
        }
    }
}
