//! Errors produced while compiling a query.
//!
//! Every failure is an ordinary value: it carries the byte offset where the
//! problem starts and the slice of the query that caused it, so callers can
//! point at the input without scanning it again.

use crate::lexer::Operator;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

/// The ceiling a query ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    QueryLength,
    TokenCount,
    NestingDepth,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Limit::QueryLength => "query length",
            Limit::TokenCount => "token count",
            Limit::NestingDepth => "nesting depth",
        };
        f.write_str(name)
    }
}

/// Why a query was rejected.
///
/// ```
/// use post_query::{parse, ParseError};
///
/// let err = parse("cat)", ["user"]).unwrap_err();
/// assert!(matches!(err, ParseError::UnbalancedGroup { position: 3, .. }));
/// assert_eq!(err.to_string(), "unbalanced `)` (at byte 3)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing closing quote (at byte {position})")]
    UnterminatedQuote { position: usize, fragment: String },
    #[error("nothing to escape after `\\` (at byte {position})")]
    InvalidEscape { position: usize },
    #[error("unbalanced `{fragment}` (at byte {position})")]
    UnbalancedGroup { position: usize, fragment: String },
    #[error("empty group `{fragment}` (at byte {position})")]
    EmptyGroup { position: usize, fragment: String },
    #[error("unknown metatag `{key}` (at byte {position})")]
    UnknownMetatag {
        key: String,
        position: usize,
        fragment: String,
    },
    #[error("invalid value `{raw_value}` for metatag `{key}` (at byte {position})")]
    InvalidMetatagValue {
        key: String,
        raw_value: String,
        position: usize,
        fragment: String,
    },
    #[error("query exceeds the {limit} limit of {max} (at byte {position})")]
    QueryTooComplex {
        limit: Limit,
        max: usize,
        position: usize,
        fragment: String,
    },
    #[error("malformed tag name `{text}` (at byte {position})")]
    MalformedTagName { text: String, position: usize },
    #[error("`{operator}` is missing an operand (at byte {position})")]
    DanglingOperator {
        operator: Operator,
        position: usize,
        fragment: String,
    },
}

impl ParseError {
    /// Byte offset into the query where the error starts.
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnterminatedQuote { position, .. }
            | ParseError::InvalidEscape { position }
            | ParseError::UnbalancedGroup { position, .. }
            | ParseError::EmptyGroup { position, .. }
            | ParseError::UnknownMetatag { position, .. }
            | ParseError::InvalidMetatagValue { position, .. }
            | ParseError::QueryTooComplex { position, .. }
            | ParseError::MalformedTagName { position, .. }
            | ParseError::DanglingOperator { position, .. } => *position,
        }
    }

    /// The offending part of the query.
    pub fn fragment(&self) -> &str {
        match self {
            ParseError::InvalidEscape { .. } => "\\",
            ParseError::MalformedTagName { text, .. } => text,
            ParseError::UnterminatedQuote { fragment, .. }
            | ParseError::UnbalancedGroup { fragment, .. }
            | ParseError::EmptyGroup { fragment, .. }
            | ParseError::UnknownMetatag { fragment, .. }
            | ParseError::InvalidMetatagValue { fragment, .. }
            | ParseError::QueryTooComplex { fragment, .. }
            | ParseError::DanglingOperator { fragment, .. } => fragment,
        }
    }

    /// `true` for errors raised while splitting the query into tokens.
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            ParseError::UnterminatedQuote { .. } | ParseError::InvalidEscape { .. }
        )
    }
}
