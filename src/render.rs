//! Text views of a query tree.
//!
//! [`QueryNode::to_infix`] writes query syntax that parses back into the same
//! tree. [`QueryNode::to_sexp`] writes a compact s-expression for logs and
//! tests.

use crate::ast::{Metatag, Query, QueryNode};
use crate::lexer::Operator;
use crate::metatag::needs_quoting;
use std::fmt;

impl QueryNode {
    /// Renders the node as query text.
    ///
    /// ```
    /// use post_query::parse;
    ///
    /// let query = parse("-rating:e  ( cat OR dog ) ~a ~b", ["rating"]).unwrap();
    /// assert_eq!(query.to_infix(), "-rating:e (cat or dog) ~a ~b");
    /// ```
    pub fn to_infix(&self) -> String {
        let mut out = String::new();
        write_level(self, &mut out);
        out
    }

    /// Renders the node as an s-expression. Groups are transparent.
    ///
    /// ```
    /// use post_query::parse;
    ///
    /// let query = parse("(cat or dog*) -user:bob", ["user"]).unwrap();
    /// assert_eq!(query.to_sexp(), "(and (or cat (wildcard dog*)) (not user:bob))");
    /// ```
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(self, &mut out);
        out
    }
}

impl Query {
    pub fn to_infix(&self) -> String {
        self.root.to_infix()
    }

    pub fn to_sexp(&self) -> String {
        self.root.to_sexp()
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_infix())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

// A whole query. A conjunction holding nothing but a disjunction is written
// with `or`, which reads better than `~` and parses back the same way.
fn write_level(node: &QueryNode, out: &mut String) {
    match node {
        QueryNode::And(children) => match children.as_slice() {
            [QueryNode::Or(alternatives)] => write_or(alternatives, out),
            _ => write_conjunction(children, out),
        },
        _ => write_group_body(node, out),
    }
}

// Inside parentheses `(~a ~b)` and `(a or b)` are different trees, so the
// conjunction shortcut does not apply here.
fn write_group_body(node: &QueryNode, out: &mut String) {
    match node {
        QueryNode::Or(alternatives) => write_or(alternatives, out),
        QueryNode::And(children) => write_conjunction(children, out),
        _ => write_term(node, out),
    }
}

fn write_or(alternatives: &[QueryNode], out: &mut String) {
    for (i, alternative) in alternatives.iter().enumerate() {
        if i > 0 {
            out.push_str(" or ");
        }
        match alternative {
            QueryNode::And(children) => write_conjunction(children, out),
            _ => write_term(alternative, out),
        }
    }
}

fn write_conjunction(children: &[QueryNode], out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        match child {
            QueryNode::Or(options) => {
                for (j, option) in options.iter().enumerate() {
                    if j > 0 {
                        out.push(' ');
                    }
                    out.push('~');
                    write_atom(option, out);
                }
            }
            _ => write_term(child, out),
        }
    }
}

fn write_term(node: &QueryNode, out: &mut String) {
    match node {
        QueryNode::Tag { name, wildcard } => write_tag(name, *wildcard, out),
        QueryNode::Metatag(metatag) => write_metatag(metatag, out),
        QueryNode::Not(inner) => {
            out.push('-');
            write_atom(inner, out);
        }
        QueryNode::Group(inner) => {
            out.push('(');
            write_group_body(inner, out);
            out.push(')');
        }
        QueryNode::And(_) | QueryNode::Or(_) => {
            out.push('(');
            write_group_body(node, out);
            out.push(')');
        }
    }
}

fn write_atom(node: &QueryNode, out: &mut String) {
    if node.is_atom() {
        write_term(node, out);
    } else {
        out.push('(');
        write_group_body(node, out);
        out.push(')');
    }
}

fn write_tag(name: &str, wildcard: bool, out: &mut String) {
    let keyword = Operator::from_keyword(name).is_some();
    for (i, ch) in name.char_indices() {
        let leading = i == 0 && (keyword || matches!(ch, '"' | '-' | '~'));
        if leading || needs_escape(ch, wildcard) {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn write_metatag(metatag: &Metatag, out: &mut String) {
    for ch in metatag.name.chars() {
        if needs_escape(ch, false) {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push(':');
    if metatag.quoted || needs_quoting(&metatag.value) {
        write_quoted(&metatag.value, out);
    } else {
        out.push_str(&metatag.value);
    }
}

fn write_quoted(text: &str, out: &mut String) {
    out.push('"');
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

fn needs_escape(ch: char, wildcard: bool) -> bool {
    ch.is_whitespace() || matches!(ch, '\\' | '(' | ')' | ':') || (ch == '*' && !wildcard)
}

fn write_sexp(node: &QueryNode, out: &mut String) {
    match node {
        QueryNode::Tag {
            name,
            wildcard: false,
        } => out.push_str(name),
        QueryNode::Tag {
            name,
            wildcard: true,
        } => {
            out.push_str("(wildcard ");
            out.push_str(name);
            out.push(')');
        }
        QueryNode::Metatag(metatag) => {
            out.push_str(&metatag.name);
            out.push(':');
            if metatag.quoted {
                write_quoted(&metatag.value, out);
            } else {
                out.push_str(&metatag.value);
            }
        }
        QueryNode::Not(inner) => write_list("not", std::slice::from_ref(&**inner), out),
        QueryNode::Or(children) => write_list("or", children, out),
        QueryNode::And(children) if children.is_empty() => out.push_str("all"),
        QueryNode::And(children) => write_list("and", children, out),
        QueryNode::Group(inner) => write_sexp(inner, out),
    }
}

fn write_list(head: &str, children: &[QueryNode], out: &mut String) {
    out.push('(');
    out.push_str(head);
    for child in children {
        out.push(' ');
        write_sexp(child, out);
    }
    out.push(')');
}
