use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_QUERY_LEN: usize = 8 * 1024;
pub const DEFAULT_MAX_TOKENS: usize = 512;
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What to do with a `key:value` token whose key the caller does not
/// recognize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownMetatagPolicy {
    /// Fail with `UnknownMetatag`.
    #[default]
    Reject,
    /// Keep the token as a plain tag named `key:value`.
    AsTag,
}

/// Per-call parser configuration.
///
/// Missing fields take their defaults when deserializing, so a partial
/// document such as `{"max_depth": 4}` is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Longest accepted query, in bytes.
    pub max_query_len: usize,
    pub max_tokens: usize,
    /// Deepest accepted parenthesis nesting.
    pub max_depth: usize,
    pub unknown_metatags: UnknownMetatagPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_query_len: DEFAULT_MAX_QUERY_LEN,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_depth: DEFAULT_MAX_DEPTH,
            unknown_metatags: UnknownMetatagPolicy::Reject,
        }
    }
}
