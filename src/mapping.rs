//! Stub rules stored as JSON mapping files.
//!
//! A mapping directory holds one `*.json` document per rule in the layout of
//! [`StubRule`]. Files are loaded in file-name order, so the numeric prefix
//! written by [`save_mappings`] preserves registration order on replay.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::MockHttpError;
use crate::rule::StubRule;

const MAX_SLUG_LEN: usize = 48;

/// Read every mapping file in `dir`
pub async fn load_mappings(dir: &Path) -> Result<Vec<StubRule>, MockHttpError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut rules = Vec::with_capacity(paths.len());
    for path in paths {
        rules.push(load_mapping_file(&path).await?);
    }
    Ok(rules)
}

/// Parse a single mapping file
pub async fn load_mapping_file(path: &Path) -> Result<StubRule, MockHttpError> {
    let content = tokio::fs::read_to_string(path).await?;
    let rule = serde_json::from_str(&content).map_err(|e| MockHttpError::Mapping {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), "Parsed mapping file");
    Ok(rule)
}

/// Write `rules` into `dir`, one file per rule, creating `dir` if needed
pub async fn save_mappings(dir: &Path, rules: &[StubRule]) -> Result<usize, MockHttpError> {
    tokio::fs::create_dir_all(dir).await?;

    for (index, rule) in rules.iter().enumerate() {
        let path = dir.join(mapping_file_name(index, rule));
        let content = serde_json::to_string_pretty(rule)?;
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), request = %rule.request, "Wrote mapping file");
    }

    Ok(rules.len())
}

/// File name for the `index`-th rule, e.g. `0003-get-batches-0-log.json`
pub fn mapping_file_name(index: usize, rule: &StubRule) -> String {
    let mut slug = String::new();
    for c in rule.request.url.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');

    let method = rule.request.method.to_ascii_lowercase();
    if slug.is_empty() {
        format!("{index:04}-{method}.json")
    } else {
        format!("{index:04}-{method}-{slug}.json")
    }
}
