//! # post-query
//!
//! Compiles image-board search queries such as
//! `score:>100 -rating:e (cat or dog) user:alice` into a validated
//! [`QueryNode`] tree a search backend can evaluate without re-reading the
//! query text.
//!
//! The metatag vocabulary (`user:`, `score:`, ...) belongs to the caller and is
//! passed to every call; nothing is cached between calls, and parsing never
//! touches I/O, so the entry points can be used from any number of threads.
//!
//! ## Example
//! ```
//! use post_query::{parse, Comparator, QueryNode};
//!
//! let query = parse("score:>100 -rating:e (cat or dog) user:alice", ["score", "rating", "user"]).unwrap();
//! let QueryNode::And(parts) = &query.root else { panic!() };
//! assert_eq!(parts.len(), 4);
//! assert!(matches!(&parts[0], QueryNode::Metatag(m) if m.comparator() == Some(Comparator::Gt)));
//! assert!(matches!(&parts[1], QueryNode::Not(_)));
//! assert!(matches!(&parts[2], QueryNode::Group(_)));
//! assert!(matches!(&parts[3], QueryNode::Metatag(m) if m.name == "user"));
//! ```

mod ast;
mod error;
pub mod lexer;
pub mod metatag;
mod normalize;
mod options;
pub mod parser;
mod render;

pub use ast::{Metatag, Query, QueryNode};
pub use error::{Limit, ParseError, Result};
pub use metatag::{Comparator, Comparison, MetatagKind, MetatagSet, RangeBound};
pub use normalize::normalize_query;
pub use options::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_QUERY_LEN, DEFAULT_MAX_TOKENS, ParseOptions,
    UnknownMetatagPolicy,
};

/// How much of an over-long query is echoed back in the error.
const OVERFLOW_FRAGMENT_CHARS: usize = 32;

/// Parses `query` against the metatag names in `metatags` with default
/// [`ParseOptions`].
pub fn parse<I, S>(query: &str, metatags: I) -> Result<Query>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compile(query, &MetatagSet::new(metatags), &ParseOptions::default())
}

/// Like [`parse`], with explicit limits and unknown-metatag policy.
///
/// ```
/// use post_query::{parse_with_options, ParseOptions, QueryNode, UnknownMetatagPolicy};
///
/// let options = ParseOptions {
///     unknown_metatags: UnknownMetatagPolicy::AsTag,
///     ..ParseOptions::default()
/// };
/// let query = parse_with_options("re:zero", ["user"], &options).unwrap();
/// assert!(matches!(&query.terms()[0], QueryNode::Tag { name, .. } if name == "re:zero"));
/// ```
pub fn parse_with_options<I, S>(query: &str, metatags: I, options: &ParseOptions) -> Result<Query>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    compile(query, &MetatagSet::new(metatags), options)
}

/// Parses `query` against an already built [`MetatagSet`]. Use this when the
/// same vocabulary serves many queries.
pub fn compile(query: &str, metatags: &MetatagSet, options: &ParseOptions) -> Result<Query> {
    check_length(query, options.max_query_len)?;
    let tokens = lexer::tokenize(query, options.max_tokens)?;
    let root = parser::parse_tokens(query, &tokens, metatags, options)?;
    Ok(Query::new(root))
}

// Runs before tokenizing so oversized input costs nothing beyond this check.
fn check_length(query: &str, max: usize) -> Result<()> {
    if query.len() <= max {
        return Ok(());
    }

    let mut position = max;
    while !query.is_char_boundary(position) {
        position -= 1;
    }
    Err(ParseError::QueryTooComplex {
        limit: Limit::QueryLength,
        max,
        position,
        fragment: query[position..]
            .chars()
            .take(OVERFLOW_FRAGMENT_CHARS)
            .collect(),
    })
}
