use crate::cli::Cli;
use anyhow::{Context, Result};
use post_query::MetatagSet;
use std::path::Path;
use tracing::debug;

/// Metatags a typical image board understands.
pub const DEFAULT_METATAGS: &[&str] = &[
    "user", "approver", "commenter", "comm", "noter", "noteupdater", "artcomm",
    "commentaryupdater", "flagger", "appealer", "upvote", "downvote", "fav",
    "ordfav", "favgroup", "ordfavgroup", "pool", "ordpool", "note", "comment",
    "commentary", "id", "rating", "source", "status", "filetype", "disapproved",
    "parent", "child", "search", "embedded", "md5", "pixelhash", "width",
    "height", "mpixels", "ratio", "views", "score", "upvotes", "downvotes",
    "favcount", "filesize", "date", "age", "order", "limit", "tagcount",
    "pixiv_id", "pixiv", "unaliased", "exif", "duration", "random", "is", "has",
    "ai", "updater", "metadataupdater", "modelhash", "comment_count",
    "deleted_comment_count", "active_comment_count", "note_count",
    "deleted_note_count", "active_note_count", "flag_count", "child_count",
    "deleted_child_count", "active_child_count", "pool_count",
    "deleted_pool_count", "active_pool_count", "series_pool_count",
    "collection_pool_count", "appeal_count", "approval_count",
    "replacement_count", "comments", "deleted_comments", "active_comments",
    "notes", "deleted_notes", "active_notes", "flags", "children",
    "deleted_children", "active_children", "pools", "deleted_pools",
    "active_pools", "series_pools", "collection_pools", "appeals", "approvals",
    "replacements", "arttags", "copytags", "chartags", "gentags", "metatags",
];

/// Builds the vocabulary from the built-in list, `--metatags-file` and
/// `--metatag`.
pub fn load(cli: &Cli) -> Result<MetatagSet> {
    let mut names: Vec<String> = Vec::new();
    if !cli.no_default_metatags {
        names.extend(DEFAULT_METATAGS.iter().map(|name| name.to_string()));
    }
    if let Some(path) = &cli.metatags_file {
        let from_file = read_names(path)?;
        debug!(path = %path.display(), count = from_file.len(), "read metatag file");
        names.extend(from_file);
    }
    names.extend(cli.metatags.iter().cloned());
    Ok(MetatagSet::new(names))
}

fn read_names(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metatag file {}", path.display()))?;
    Ok(parse_names(&text))
}

fn parse_names(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
