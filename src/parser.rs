//! Token stream to query tree.
//!
//! Each nesting level reads
//!
//! ```text
//! level  := alt ("or" alt)*
//! alt    := factor (["and"] factor)*
//! factor := "not"* item
//! item   := prefix? (TAG | WILDCARD | QUOTED | METATAG | "(" level ")")
//! ```
//!
//! An `alt` becomes one conjunction. Its `~` terms are gathered into a single
//! `Or` that sits where the first of them was written.

use crate::ast::{Metatag, QueryNode};
use crate::error::{Limit, ParseError, Result};
use crate::lexer::{Operator, Prefix, Span, Token, TokenKind};
use crate::metatag::{self, MetatagSet};
use crate::options::{ParseOptions, UnknownMetatagPolicy};

/// Parses a token sequence produced by [`crate::lexer::tokenize`] for
/// `source`. The result is the root level, always a conjunction.
///
/// A missing trailing `EndOfInput` is tolerated, so an empty slice parses as
/// the match-all query.
pub fn parse_tokens(
    source: &str,
    tokens: &[Token],
    metatags: &MetatagSet,
    options: &ParseOptions,
) -> Result<QueryNode> {
    Parser::new(source, tokens, metatags, options).parse()
}

static END_OF_INPUT: Token = Token {
    kind: TokenKind::EndOfInput,
    span: Span { start: 0, end: 0 },
};

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    metatags: &'a MetatagSet,
    options: &'a ParseOptions,
    depth: usize,
}

/// A parsed factor and whether it was written as `~term`.
struct Factor {
    node: QueryNode,
    optional: bool,
}

impl<'a> Parser<'a> {
    fn new(
        source: &'a str,
        tokens: &'a [Token],
        metatags: &'a MetatagSet,
        options: &'a ParseOptions,
    ) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            metatags,
            options,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<QueryNode> {
        let level = self.parse_level()?;
        let token = self.peek();
        if matches!(token.kind, TokenKind::GroupClose) {
            return Err(self.unbalanced(token.span));
        }

        Ok(match level {
            None => QueryNode::And(Vec::new()),
            Some(node @ QueryNode::And(_)) => node,
            Some(other) => QueryNode::And(vec![other]),
        })
    }

    /// `None` when the level holds no terms at all.
    fn parse_level(&mut self) -> Result<Option<QueryNode>> {
        let Some(first) = self.parse_alt()? else {
            if let TokenKind::Operator(Operator::Or) = self.peek().kind {
                return Err(self.dangling(Operator::Or, self.peek().span));
            }
            return Ok(None);
        };

        let mut alternatives = vec![first];
        while let TokenKind::Operator(Operator::Or) = self.peek().kind {
            let span = self.advance().span;
            match self.parse_alt()? {
                Some(alt) => alternatives.push(alt),
                None => return Err(self.dangling(Operator::Or, span)),
            }
        }

        Ok(Some(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            QueryNode::Or(alternatives)
        }))
    }

    fn parse_alt(&mut self) -> Result<Option<QueryNode>> {
        let mut conjunction = Conjunction::default();
        loop {
            match self.peek().kind {
                TokenKind::Operator(Operator::Or)
                | TokenKind::GroupClose
                | TokenKind::EndOfInput => break,
                TokenKind::Operator(Operator::And) => {
                    let span = self.advance().span;
                    if conjunction.is_empty() || !self.at_factor_start() {
                        return Err(self.dangling(Operator::And, span));
                    }
                }
                _ => {
                    let factor = self.parse_factor()?;
                    conjunction.push(factor);
                }
            }
        }
        Ok(conjunction.finish())
    }

    // `not` flips the negation once per occurrence; a `-` prefix counts as one
    // more. An optional term that ends up negated is simply required absent.
    fn parse_factor(&mut self) -> Result<Factor> {
        let mut negated = false;
        while let TokenKind::Operator(Operator::Not) = self.peek().kind {
            let span = self.advance().span;
            if !self.at_factor_start() {
                return Err(self.dangling(Operator::Not, span));
            }
            negated = !negated;
        }

        let (node, prefix) = self.parse_item()?;
        let mut optional = false;
        match prefix {
            Prefix::Plain => {}
            Prefix::Negated => negated = !negated,
            Prefix::Optional => optional = !negated,
        }

        let node = if negated { node.negate() } else { node };
        Ok(Factor { node, optional })
    }

    // Callers check `at_factor_start` and consume `not` first.
    fn parse_item(&mut self) -> Result<(QueryNode, Prefix)> {
        debug_assert!(
            !matches!(
                self.peek().kind,
                TokenKind::Operator(_) | TokenKind::GroupClose | TokenKind::EndOfInput
            ),
            "parse_item called on {:?}",
            self.peek().kind
        );
        let token = self.advance();
        let span = token.span;
        match &token.kind {
            TokenKind::Word { text, prefix } => {
                Ok((QueryNode::tag(text.to_ascii_lowercase()), *prefix))
            }
            TokenKind::Wildcard { pattern, prefix } => Ok((
                QueryNode::Tag {
                    name: pattern.to_ascii_lowercase(),
                    wildcard: true,
                },
                *prefix,
            )),
            TokenKind::Quoted {
                text,
                wildcard,
                prefix,
            } => {
                if text.is_empty() {
                    return Err(ParseError::MalformedTagName {
                        text: self.slice(span).to_string(),
                        position: span.start,
                    });
                }
                Ok((
                    QueryNode::Tag {
                        name: text.to_ascii_lowercase(),
                        wildcard: *wildcard,
                    },
                    *prefix,
                ))
            }
            TokenKind::Metatag {
                key,
                value,
                quoted,
                wildcard,
                prefix,
            } => {
                let node = self.resolve_metatag(span, key, value, *quoted, *wildcard)?;
                Ok((node, *prefix))
            }
            TokenKind::GroupOpen { prefix } => {
                let prefix = *prefix;
                Ok((self.parse_group(span)?, prefix))
            }
            TokenKind::Operator(operator) => Err(self.dangling(*operator, span)),
            TokenKind::GroupClose => Err(self.unbalanced(span)),
            TokenKind::EndOfInput => Err(ParseError::MalformedTagName {
                text: String::new(),
                position: span.start,
            }),
        }
    }

    fn parse_group(&mut self, open: Span) -> Result<QueryNode> {
        if self.depth >= self.options.max_depth {
            return Err(ParseError::QueryTooComplex {
                limit: Limit::NestingDepth,
                max: self.options.max_depth,
                position: open.start,
                fragment: self.slice(open).to_string(),
            });
        }

        self.depth += 1;
        let level = self.parse_level()?;
        self.depth -= 1;

        let close = self.peek();
        if !matches!(close.kind, TokenKind::GroupClose) {
            return Err(self.unbalanced(open));
        }
        let close = self.advance().span;

        match level {
            Some(inner) => Ok(QueryNode::Group(Box::new(inner))),
            None => Err(ParseError::EmptyGroup {
                position: open.start,
                fragment: self.source[open.start..close.end].to_string(),
            }),
        }
    }

    fn resolve_metatag(
        &self,
        span: Span,
        key: &str,
        value: &str,
        quoted: bool,
        wildcard: bool,
    ) -> Result<QueryNode> {
        let fragment = || self.slice(span).to_string();
        if key.is_empty() {
            return Err(ParseError::MalformedTagName {
                text: fragment(),
                position: span.start,
            });
        }

        let Some(kind) = self.metatags.classify(key) else {
            return match self.options.unknown_metatags {
                UnknownMetatagPolicy::Reject => Err(ParseError::UnknownMetatag {
                    key: key.to_string(),
                    position: span.start,
                    fragment: fragment(),
                }),
                UnknownMetatagPolicy::AsTag => Ok(QueryNode::Tag {
                    name: format!("{key}:{value}").to_ascii_lowercase(),
                    wildcard,
                }),
            };
        };

        let name = key.to_lowercase();
        let comparison = metatag::validate_value(kind, value).map_err(|_| {
            ParseError::InvalidMetatagValue {
                key: name.clone(),
                raw_value: value.to_string(),
                position: span.start,
                fragment: fragment(),
            }
        })?;

        Ok(QueryNode::Metatag(Metatag {
            name,
            kind,
            value: value.to_string(),
            quoted: quoted || metatag::needs_quoting(value),
            comparison,
        }))
    }

    fn at_factor_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Word { .. }
                | TokenKind::Wildcard { .. }
                | TokenKind::Quoted { .. }
                | TokenKind::Metatag { .. }
                | TokenKind::GroupOpen { .. }
                | TokenKind::Operator(Operator::Not)
        )
    }

    // An operator left hanging next to a stray or missing parenthesis is
    // reported as the imbalance.
    fn dangling(&self, operator: Operator, span: Span) -> ParseError {
        if let Some(err) = self.unbalanced_group() {
            return err;
        }
        ParseError::DanglingOperator {
            operator,
            position: span.start,
            fragment: self.slice(span).to_string(),
        }
    }

    /// The first `)` without a partner, or else the innermost `(` left open.
    fn unbalanced_group(&self) -> Option<ParseError> {
        let mut open = Vec::new();
        for token in self.tokens {
            match token.kind {
                TokenKind::GroupOpen { .. } => open.push(token.span),
                TokenKind::GroupClose => {
                    if open.pop().is_none() {
                        return Some(self.unbalanced(token.span));
                    }
                }
                _ => {}
            }
        }
        open.pop().map(|span| self.unbalanced(span))
    }

    fn unbalanced(&self, span: Span) -> ParseError {
        ParseError::UnbalancedGroup {
            position: span.start,
            fragment: self.slice(span).to_string(),
        }
    }

    fn slice(&self, span: Span) -> &'a str {
        span.slice(self.source)
    }

    fn peek(&self) -> &'a Token {
        self.tokens.get(self.pos).unwrap_or(&END_OF_INPUT)
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }
}

/// Collects the factors of one `alt`.
#[derive(Default)]
struct Conjunction {
    required: Vec<QueryNode>,
    optional: Vec<QueryNode>,
    optional_slot: Option<usize>,
}

impl Conjunction {
    fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }

    fn push(&mut self, factor: Factor) {
        if factor.optional {
            if self.optional_slot.is_none() {
                self.optional_slot = Some(self.required.len());
            }
            self.optional.push(factor.node);
        } else {
            self.required.push(factor.node);
        }
    }

    fn finish(self) -> Option<QueryNode> {
        let Conjunction {
            mut required,
            mut optional,
            optional_slot,
        } = self;

        let has_choice = optional.len() > 1;
        if let Some(slot) = optional_slot {
            let node = if has_choice {
                QueryNode::Or(optional)
            } else {
                optional.remove(0)
            };
            required.insert(slot, node);
        }

        match required.len() {
            0 => None,
            1 if !has_choice => required.pop(),
            _ => Some(QueryNode::And(required)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> Result<QueryNode> {
        let metatags = MetatagSet::new(["user", "score", "rating"]);
        let options = ParseOptions::default();
        let tokens = tokenize(source, options.max_tokens)?;
        parse_tokens(source, &tokens, &metatags, &options)
    }

    fn tag(name: &str) -> QueryNode {
        QueryNode::tag(name)
    }

    fn and(children: Vec<QueryNode>) -> QueryNode {
        QueryNode::And(children)
    }

    fn or(children: Vec<QueryNode>) -> QueryNode {
        QueryNode::Or(children)
    }

    #[test]
    fn root_is_always_a_conjunction() {
        assert_eq!(parse("").unwrap(), and(vec![]));
        assert_eq!(parse("cat").unwrap(), and(vec![tag("cat")]));
        assert_eq!(
            parse("cat or dog").unwrap(),
            and(vec![or(vec![tag("cat"), tag("dog")])])
        );
    }

    #[test]
    fn explicit_and_matches_adjacency() {
        assert_eq!(parse("cat and dog").unwrap(), parse("cat dog").unwrap());
        assert_eq!(
            parse("a b or c").unwrap(),
            and(vec![or(vec![and(vec![tag("a"), tag("b")]), tag("c")])])
        );
    }

    #[test]
    fn optional_terms_share_one_disjunction() {
        assert_eq!(
            parse("a ~b c ~d").unwrap(),
            and(vec![tag("a"), or(vec![tag("b"), tag("d")]), tag("c")])
        );
        assert_eq!(
            parse("~b ~d").unwrap(),
            and(vec![or(vec![tag("b"), tag("d")])])
        );
    }

    #[test]
    fn lone_optional_term_is_required() {
        assert_eq!(parse("a ~b").unwrap(), parse("a b").unwrap());
        assert_eq!(parse("~b").unwrap(), and(vec![tag("b")]));
    }

    #[test]
    fn optional_choice_inside_alternative_keeps_its_conjunction() {
        assert_eq!(
            parse("~a ~b or c").unwrap(),
            and(vec![or(vec![
                and(vec![or(vec![tag("a"), tag("b")])]),
                tag("c"),
            ])])
        );
    }

    #[test]
    fn negation_cancels_by_parity() {
        assert_eq!(parse("not -cat").unwrap(), and(vec![tag("cat")]));
        assert_eq!(parse("not not cat").unwrap(), and(vec![tag("cat")]));
        assert_eq!(
            parse("not cat").unwrap(),
            and(vec![tag("cat").negate()])
        );
        assert_eq!(
            parse("not ~cat dog").unwrap(),
            and(vec![tag("cat").negate(), tag("dog")])
        );
    }

    #[test]
    fn groups_nest() {
        assert_eq!(
            parse("-(a or b) c").unwrap(),
            and(vec![
                QueryNode::Group(Box::new(or(vec![tag("a"), tag("b")]))).negate(),
                tag("c"),
            ])
        );
    }

    #[test]
    fn dangling_operators_are_rejected() {
        let cases = [
            ("or cat", Operator::Or, 0),
            ("cat or", Operator::Or, 4),
            ("cat and", Operator::And, 4),
            ("and cat", Operator::And, 0),
            ("not", Operator::Not, 0),
            ("cat not", Operator::Not, 4),
            ("(or)", Operator::Or, 1),
            ("a and or b", Operator::And, 2),
        ];
        for (query, expected, at) in cases {
            match parse(query) {
                Err(ParseError::DanglingOperator {
                    operator, position, ..
                }) => {
                    assert_eq!(operator, expected, "{query}");
                    assert_eq!(position, at, "{query}");
                }
                other => panic!("{query:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn group_errors_point_at_the_delimiter() {
        assert!(matches!(
            parse("a )"),
            Err(ParseError::UnbalancedGroup { position: 2, .. })
        ));
        assert!(matches!(
            parse("a (b"),
            Err(ParseError::UnbalancedGroup { position: 2, .. })
        ));
        match parse("x ( )") {
            Err(ParseError::EmptyGroup { position, fragment }) => {
                assert_eq!(position, 2);
                assert_eq!(fragment, "( )");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn operators_beside_stray_parentheses_report_the_imbalance() {
        let cases = [
            ("(cat or", 0),
            ("(cat and", 0),
            ("(not", 0),
            ("a (b or", 2),
            ("cat or )", 7),
            ("and )", 4),
        ];
        for (query, at) in cases {
            match parse(query) {
                Err(ParseError::UnbalancedGroup { position, .. }) => {
                    assert_eq!(position, at, "{query}")
                }
                other => panic!("{query:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn tag_names_fold_ascii_case_only() {
        assert_eq!(
            parse("Cat_Ears CAT* \"Big Ä\"").unwrap(),
            and(vec![
                tag("cat_ears"),
                QueryNode::Tag {
                    name: "cat*".into(),
                    wildcard: true,
                },
                tag("big Ä"),
            ])
        );
    }

    #[test]
    fn token_slice_without_end_marker() {
        let metatags = MetatagSet::default();
        let options = ParseOptions::default();
        assert_eq!(
            parse_tokens("", &[], &metatags, &options).unwrap(),
            and(vec![])
        );

        let mut tokens = tokenize("cat", 8).unwrap();
        tokens.pop();
        assert_eq!(
            parse_tokens("cat", &tokens, &metatags, &options).unwrap(),
            and(vec![tag("cat")])
        );
    }

    #[test]
    fn metatags_resolve_against_the_set() {
        let QueryNode::And(children) = parse("User:alice").unwrap() else {
            panic!()
        };
        let QueryNode::Metatag(metatag) = &children[0] else {
            panic!()
        };
        assert_eq!(metatag.name, "user");
        assert_eq!(metatag.value, "alice");
        assert!(!metatag.quoted);

        assert!(matches!(
            parse("colour:red"),
            Err(ParseError::UnknownMetatag { ref key, .. }) if key == "colour"
        ));
        assert!(matches!(
            parse(":red"),
            Err(ParseError::MalformedTagName { position: 0, .. })
        ));
        assert!(matches!(
            parse("score:lots"),
            Err(ParseError::InvalidMetatagValue { ref raw_value, .. }) if raw_value == "lots"
        ));
    }

    #[test]
    fn unknown_metatags_can_become_tags() {
        let metatags = MetatagSet::default();
        let options = ParseOptions {
            unknown_metatags: UnknownMetatagPolicy::AsTag,
            ..ParseOptions::default()
        };
        let tokens = tokenize("re:zero*", 8).unwrap();
        let node = parse_tokens("re:zero*", &tokens, &metatags, &options).unwrap();
        assert_eq!(
            node,
            and(vec![QueryNode::Tag {
                name: "re:zero*".into(),
                wildcard: true,
            }])
        );
    }

    #[test]
    fn empty_quoted_tag_is_malformed() {
        assert!(matches!(
            parse("cat \"\""),
            Err(ParseError::MalformedTagName { position: 4, .. })
        ));
    }

    #[test]
    fn depth_limit_counts_open_groups() {
        let metatags = MetatagSet::default();
        let options = ParseOptions {
            max_depth: 2,
            ..ParseOptions::default()
        };
        let ok = "((a))";
        let tokens = tokenize(ok, 64).unwrap();
        assert!(parse_tokens(ok, &tokens, &metatags, &options).is_ok());

        let deep = "((( a )))";
        let tokens = tokenize(deep, 64).unwrap();
        assert!(matches!(
            parse_tokens(deep, &tokens, &metatags, &options),
            Err(ParseError::QueryTooComplex {
                limit: Limit::NestingDepth,
                max: 2,
                position: 2,
                ..
            })
        ));
    }
}
