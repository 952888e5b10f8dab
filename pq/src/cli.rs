use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use post_query::{ParseOptions, UnknownMetatagPolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pq", version, about = "Parse image-board search queries")]
pub struct Cli {
    /// Queries to parse. Without any, queries are read from stdin, one per line.
    pub queries: Vec<String>,
    /// Recognize an extra metatag name. Can be repeated.
    #[arg(long = "metatag", value_name = "NAME")]
    pub metatags: Vec<String>,
    /// File with one metatag name per line; `#` starts a comment.
    #[arg(long, value_name = "PATH")]
    pub metatags_file: Option<PathBuf>,
    /// Do not load the built-in image-board vocabulary.
    #[arg(long)]
    pub no_default_metatags: bool,
    /// JSON document with parser options; missing fields keep their defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub max_depth: Option<usize>,
    #[arg(long)]
    pub max_tokens: Option<usize>,
    /// Longest accepted query, in bytes.
    #[arg(long)]
    pub max_len: Option<usize>,
    #[arg(long, value_enum)]
    pub unknown_metatags: Option<UnknownMetatags>,
    #[arg(long, value_enum, default_value_t = Format::Infix)]
    pub format: Format,
    /// Print the normalized tree instead of the parsed one.
    #[arg(long)]
    pub normalize: bool,
    /// Log filter, e.g. `debug` or `pq=info`. Overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Infix,
    Sexp,
    Json,
    Debug,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnknownMetatags {
    Reject,
    Tag,
}

impl From<UnknownMetatags> for UnknownMetatagPolicy {
    fn from(value: UnknownMetatags) -> Self {
        match value {
            UnknownMetatags::Reject => UnknownMetatagPolicy::Reject,
            UnknownMetatags::Tag => UnknownMetatagPolicy::AsTag,
        }
    }
}

impl Cli {
    /// Reads `--config` if given, then applies the individual overrides.
    pub fn parse_options(&self) -> Result<ParseOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => ParseOptions::default(),
        };

        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        if let Some(max_tokens) = self.max_tokens {
            options.max_tokens = max_tokens;
        }
        if let Some(max_len) = self.max_len {
            options.max_query_len = max_len;
        }
        if let Some(policy) = self.unknown_metatags {
            options.unknown_metatags = policy.into();
        }
        Ok(options)
    }
}
