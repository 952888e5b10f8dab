//! Splits raw query text into tokens.
//!
//! The lexer works on Unicode scalar values and never normalizes them: CJK,
//! emoji and combining marks are ordinary tag characters. Only whitespace,
//! `(`, `)`, `"`, `\` and the first `:` of a bare token carry structure.

use crate::error::{Limit, ParseError, Result};
use std::fmt;

/// Byte range of a token in the source query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Marker attached to a term written as `-term` or `~term`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Plain,
    /// `-term`: the term must not match.
    Negated,
    /// `~term`: at least one optional term of the same conjunction must match.
    Optional,
}

/// Boolean keywords. They are only recognized as a whole, unescaped,
/// unprefixed token, so `orange` or `\or` stay ordinary tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    pub fn from_keyword(text: &str) -> Option<Self> {
        [Operator::And, Operator::Or, Operator::Not]
            .into_iter()
            .find(|op| text.eq_ignore_ascii_case(op.keyword()))
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain tag text with escapes resolved.
    Word { text: String, prefix: Prefix },
    /// Tag text containing an unescaped `*`.
    Wildcard { pattern: String, prefix: Prefix },
    /// `"..."` outside a metatag value.
    Quoted {
        text: String,
        wildcard: bool,
        prefix: Prefix,
    },
    /// `key:value`, split at the first unescaped colon.
    Metatag {
        key: String,
        value: String,
        quoted: bool,
        wildcard: bool,
        prefix: Prefix,
    },
    Operator(Operator),
    GroupOpen { prefix: Prefix },
    GroupClose,
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Tokenizes `input`, failing once more than `max_tokens` tokens are produced.
///
/// The returned sequence always ends with [`TokenKind::EndOfInput`].
///
/// ```
/// use post_query::lexer::{tokenize, Prefix, TokenKind};
///
/// let tokens = tokenize("-rating:e cat", 16).unwrap();
/// assert!(matches!(
///     &tokens[0].kind,
///     TokenKind::Metatag { key, value, prefix: Prefix::Negated, .. } if key == "rating" && value == "e"
/// ));
/// assert!(matches!(&tokens[1].kind, TokenKind::Word { text, .. } if text == "cat"));
/// assert!(matches!(tokens[2].kind, TokenKind::EndOfInput));
/// ```
pub fn tokenize(input: &str, max_tokens: usize) -> Result<Vec<Token>> {
    Lexer::new(input, max_tokens).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    max_tokens: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, max_tokens: usize) -> Self {
        Self {
            input,
            pos: 0,
            max_tokens,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        loop {
            self.skip_ws();
            let start = self.pos;
            let Some(ch) = self.peek_char() else {
                break;
            };
            let kind = match ch {
                '(' => {
                    self.advance_char();
                    TokenKind::GroupOpen {
                        prefix: Prefix::Plain,
                    }
                }
                ')' => {
                    self.advance_char();
                    TokenKind::GroupClose
                }
                _ => self.lex_term()?,
            };
            self.push(kind, start)?;
        }

        let end = self.input.len();
        self.tokens.push(Token {
            kind: TokenKind::EndOfInput,
            span: Span::new(end, end),
        });
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, start: usize) -> Result<()> {
        let span = Span::new(start, self.pos);
        if self.tokens.len() >= self.max_tokens {
            return Err(ParseError::QueryTooComplex {
                limit: Limit::TokenCount,
                max: self.max_tokens,
                position: start,
                fragment: span.slice(self.input).to_string(),
            });
        }
        self.tokens.push(Token { kind, span });
        Ok(())
    }

    fn lex_term(&mut self) -> Result<TokenKind> {
        let prefix = self.lex_prefix();
        match self.peek_char() {
            Some('(') => {
                self.advance_char();
                Ok(TokenKind::GroupOpen { prefix })
            }
            Some('"') => {
                let (text, wildcard) = self.lex_quoted()?;
                Ok(TokenKind::Quoted {
                    text,
                    wildcard,
                    prefix,
                })
            }
            _ => self.lex_bare(prefix),
        }
    }

    // `-` and `~` only attach when something follows them directly; a lone
    // hyphen is a tag of its own.
    fn lex_prefix(&mut self) -> Prefix {
        let mut chars = self.remaining().chars();
        let prefix = match chars.next() {
            Some('-') => Prefix::Negated,
            Some('~') => Prefix::Optional,
            _ => return Prefix::Plain,
        };
        match chars.next() {
            Some(next) if !next.is_whitespace() && next != ')' => {
                self.advance_char();
                prefix
            }
            _ => Prefix::Plain,
        }
    }

    fn lex_bare(&mut self, prefix: Prefix) -> Result<TokenKind> {
        let mut text = String::new();
        let mut escaped = false;
        let mut wildcard = false;
        while let Some(ch) = self.peek_char() {
            if is_term_breaker(ch) {
                break;
            }
            match ch {
                '\\' => {
                    text.push(self.lex_escape()?);
                    escaped = true;
                }
                ':' => {
                    self.advance_char();
                    return self.lex_metatag(text, wildcard, prefix);
                }
                _ => {
                    wildcard |= ch == '*';
                    text.push(ch);
                    self.advance_char();
                }
            }
        }

        if !escaped && prefix == Prefix::Plain {
            if let Some(op) = Operator::from_keyword(&text) {
                return Ok(TokenKind::Operator(op));
            }
        }

        if wildcard {
            Ok(TokenKind::Wildcard {
                pattern: text,
                prefix,
            })
        } else {
            Ok(TokenKind::Word { text, prefix })
        }
    }

    // Everything after the first colon is the value, further colons included
    // (`source:http://example.com`).
    fn lex_metatag(&mut self, key: String, wildcard: bool, prefix: Prefix) -> Result<TokenKind> {
        if self.peek_char() == Some('"') {
            let (value, value_wildcard) = self.lex_quoted()?;
            return Ok(TokenKind::Metatag {
                key,
                value,
                quoted: true,
                wildcard: wildcard || value_wildcard,
                prefix,
            });
        }

        let mut value = String::new();
        let mut wildcard = wildcard;
        while let Some(ch) = self.peek_char() {
            if is_term_breaker(ch) {
                break;
            }
            if ch == '\\' {
                value.push(self.lex_escape()?);
                continue;
            }
            wildcard |= ch == '*';
            value.push(ch);
            self.advance_char();
        }

        Ok(TokenKind::Metatag {
            key,
            value,
            quoted: false,
            wildcard,
            prefix,
        })
    }

    fn lex_escape(&mut self) -> Result<char> {
        let position = self.pos;
        self.advance_char(); // backslash
        let Some(ch) = self.peek_char() else {
            return Err(ParseError::InvalidEscape { position });
        };
        self.advance_char();
        Ok(ch)
    }

    // A backslash inside quotes takes the next character literally; running out
    // of input before the closing quote is reported at the opening quote.
    fn lex_quoted(&mut self) -> Result<(String, bool)> {
        let quote_pos = self.pos;
        self.advance_char(); // opening quote
        let mut text = String::new();
        let mut wildcard = false;
        while let Some(ch) = self.peek_char() {
            self.advance_char();
            match ch {
                '"' => return Ok((text, wildcard)),
                '\\' => {
                    let Some(escaped) = self.peek_char() else {
                        break;
                    };
                    text.push(escaped);
                    self.advance_char();
                }
                _ => {
                    wildcard |= ch == '*';
                    text.push(ch);
                }
            }
        }

        Err(ParseError::UnterminatedQuote {
            position: quote_pos,
            fragment: self.input[quote_pos..].to_string(),
        })
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
}

fn is_term_breaker(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')')
}
