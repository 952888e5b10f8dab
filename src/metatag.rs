//! Metatag vocabulary and value validation.
//!
//! Which metatag names exist is up to the caller and arrives with every parse
//! call as a [`MetatagSet`]. What shape a recognized metatag's value must have
//! is engine knowledge and lives in [`MetatagKind::of`].

use serde::Serialize;
use std::collections::HashSet;

/// Value shape of a recognized metatag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetatagKind {
    /// Comparisons and ranges (`score:>100`, `width:1000..2000`).
    Numeric,
    /// Free text (`user:alice`, `source:"some site"`).
    Text,
    /// `true` / `false` switches (`embedded:true`).
    Flag,
    /// Identifier-like members checked by the backend (`is:parent`, `rating:e`).
    Enumeration,
    /// Short form of a `*_count` metatag (`comments:>5` is `comment_count:>5`).
    CountAlias(&'static str),
}

impl MetatagKind {
    /// Built-in kind for a lowercase metatag name. Names the table does not
    /// know are free text.
    pub fn of(name: &str) -> Self {
        match name {
            "id" | "width" | "height" | "mpixels" | "ratio" | "score" | "upvotes"
            | "downvotes" | "favcount" | "filesize" | "date" | "age" | "tagcount"
            | "pixiv_id" | "duration" | "limit" | "random" | "views" | "arttags"
            | "copytags" | "chartags" | "gentags" | "metatags" | "comment_count"
            | "deleted_comment_count" | "active_comment_count" | "note_count"
            | "deleted_note_count" | "active_note_count" | "flag_count" | "child_count"
            | "deleted_child_count" | "active_child_count" | "pool_count"
            | "deleted_pool_count" | "active_pool_count" | "series_pool_count"
            | "collection_pool_count" | "appeal_count" | "approval_count"
            | "replacement_count" => MetatagKind::Numeric,
            "comments" => MetatagKind::CountAlias("comment_count"),
            "deleted_comments" => MetatagKind::CountAlias("deleted_comment_count"),
            "active_comments" => MetatagKind::CountAlias("active_comment_count"),
            "notes" => MetatagKind::CountAlias("note_count"),
            "deleted_notes" => MetatagKind::CountAlias("deleted_note_count"),
            "active_notes" => MetatagKind::CountAlias("active_note_count"),
            "flags" => MetatagKind::CountAlias("flag_count"),
            "children" => MetatagKind::CountAlias("child_count"),
            "deleted_children" => MetatagKind::CountAlias("deleted_child_count"),
            "active_children" => MetatagKind::CountAlias("active_child_count"),
            "pools" => MetatagKind::CountAlias("pool_count"),
            "deleted_pools" => MetatagKind::CountAlias("deleted_pool_count"),
            "active_pools" => MetatagKind::CountAlias("active_pool_count"),
            "series_pools" => MetatagKind::CountAlias("series_pool_count"),
            "collection_pools" => MetatagKind::CountAlias("collection_pool_count"),
            "appeals" => MetatagKind::CountAlias("appeal_count"),
            "approvals" => MetatagKind::CountAlias("approval_count"),
            "replacements" => MetatagKind::CountAlias("replacement_count"),
            "is" | "has" | "rating" | "status" | "filetype" | "order" => {
                MetatagKind::Enumeration
            }
            "embedded" => MetatagKind::Flag,
            _ => MetatagKind::Text,
        }
    }

    /// Whether values of this kind are parsed into a [`Comparison`].
    pub fn is_numeric(self) -> bool {
        matches!(self, MetatagKind::Numeric | MetatagKind::CountAlias(_))
    }
}

/// The metatag names a caller recognizes for one parse.
///
/// Matching is case-insensitive.
///
/// ```
/// use post_query::{MetatagKind, MetatagSet};
///
/// let set = MetatagSet::new(["User", "score", "comments"]);
/// assert_eq!(set.classify("USER"), Some(MetatagKind::Text));
/// assert_eq!(set.classify("score"), Some(MetatagKind::Numeric));
/// assert_eq!(set.classify("comments"), Some(MetatagKind::CountAlias("comment_count")));
/// assert_eq!(set.classify("width"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetatagSet {
    names: HashSet<String>,
}

impl MetatagSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.names.contains(&key.to_lowercase())
    }

    /// Looks `key` up in the set and returns its built-in kind, or `None`
    /// when the caller does not recognize it.
    pub fn classify(&self, key: &str) -> Option<MetatagKind> {
        let name = key.to_lowercase();
        if self.names.contains(&name) {
            Some(MetatagKind::of(&name))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for MetatagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        MetatagSet::new(iter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    Range,
}

/// Whether the end of a range is part of it (`1..5` vs `1...5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBound {
    Inclusive,
    Exclusive,
}

/// Parsed value of a numeric metatag. Operands keep their text so units and
/// date formats stay the backend's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Compare { op: Comparator, operand: String },
    /// Open ends are `None`; at least one end is present.
    Range {
        start: Option<String>,
        end: Option<String>,
        bound: RangeBound,
    },
}

impl Comparison {
    pub fn comparator(&self) -> Comparator {
        match self {
            Comparison::Compare { op, .. } => *op,
            Comparison::Range { .. } => Comparator::Range,
        }
    }
}

/// Marker for a value that does not fit its metatag's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidValue;

/// Checks `raw` against the value shape of `kind`. Numeric kinds yield their
/// parsed comparison; every other kind yields `None`.
pub fn validate_value(kind: MetatagKind, raw: &str) -> Result<Option<Comparison>, InvalidValue> {
    match kind {
        MetatagKind::Numeric | MetatagKind::CountAlias(_) => {
            parse_comparison(raw).map(Some).ok_or(InvalidValue)
        }
        MetatagKind::Enumeration if is_identifier_like(raw) => Ok(None),
        MetatagKind::Flag if parse_flag(raw).is_some() => Ok(None),
        MetatagKind::Text if !raw.is_empty() => Ok(None),
        MetatagKind::Enumeration | MetatagKind::Flag | MetatagKind::Text => Err(InvalidValue),
    }
}

/// Reads `>=`, `<=`, `>`, `<`, `=` prefixes, `a..b` inclusive and `a...b`
/// exclusive ranges, or a bare operand meaning equality.
fn parse_comparison(raw: &str) -> Option<Comparison> {
    const OPERATORS: [(&str, Comparator); 5] = [
        (">=", Comparator::Gte),
        ("<=", Comparator::Lte),
        (">", Comparator::Gt),
        ("<", Comparator::Lt),
        ("=", Comparator::Eq),
    ];

    for (symbol, op) in OPERATORS {
        if let Some(operand) = raw.strip_prefix(symbol) {
            return is_numeric_operand(operand).then(|| Comparison::Compare {
                op,
                operand: operand.to_string(),
            });
        }
    }

    if let Some((start, end, bound)) = split_range(raw) {
        return parse_range(start, end, bound);
    }

    is_numeric_operand(raw).then(|| Comparison::Compare {
        op: Comparator::Eq,
        operand: raw.to_string(),
    })
}

fn split_range(raw: &str) -> Option<(&str, &str, RangeBound)> {
    if let Some(index) = raw.find("...") {
        return Some((&raw[..index], &raw[index + 3..], RangeBound::Exclusive));
    }
    raw.find("..")
        .map(|index| (&raw[..index], &raw[index + 2..], RangeBound::Inclusive))
}

fn parse_range(start: &str, end: &str, bound: RangeBound) -> Option<Comparison> {
    fn endpoint(text: &str) -> Option<Option<String>> {
        if text.is_empty() {
            Some(None)
        } else if is_numeric_operand(text) {
            Some(Some(text.to_string()))
        } else {
            None
        }
    }

    let start = endpoint(start)?;
    let end = endpoint(end)?;
    if start.is_none() && end.is_none() {
        return None;
    }
    Some(Comparison::Range { start, end, bound })
}

// Numbers, dates (`2024-01-31`), durations (`3d`), sizes (`1.5mb`) and ratios
// (`16:9`) all qualify; the operand just has to contain a digit.
fn is_numeric_operand(text: &str) -> bool {
    !text.is_empty()
        && !text.contains("..")
        && text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '/' | '_' | '+' | '-'))
}

fn is_identifier_like(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ','))
}

/// Whether a metatag value only survives rendering inside quotes.
pub fn needs_quoting(value: &str) -> bool {
    value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\'))
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}
