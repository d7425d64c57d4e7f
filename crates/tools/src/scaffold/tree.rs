//! Parse textual folder trees and materialise them on disk.
//!
//! Accepts the shapes models produce: box-drawing (`├──`, `└──`, `│`),
//! ASCII (`|--`, `` `-- ``, `+--`) and plain indentation. Nesting is derived
//! from the column where each name starts. A trailing `/` marks a directory,
//! and so does any entry with deeper entries below it.

use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the tree root, `/`-separated.
    pub path: String,
    pub is_dir: bool,
}

/// Branch connectors, longest first. Trailing dashes after one are also skipped.
const CONNECTORS: &[&str] = &["├──", "└──", "├─", "└─", "|--", "+--", "`--"];

/// Byte offset where the entry name begins, after guides and connectors.
/// Names may themselves start with `+` or `-` (`+page.svelte`).
fn name_start(line: &str) -> Option<usize> {
    let mut rest = line;
    loop {
        let skipped = line.len() - rest.len();
        let Some(c) = rest.chars().next() else {
            return None;
        };
        if c.is_whitespace() || c == '│' || c == '┆' {
            rest = &rest[c.len_utf8()..];
        } else if c == '|' && rest[1..].chars().next().is_none_or(char::is_whitespace) {
            rest = &rest[1..];
        } else if let Some(connector) = CONNECTORS.iter().find(|t| rest.starts_with(**t)) {
            rest = rest[connector.len()..].trim_start_matches(['─', '-']);
        } else {
            return Some(skipped);
        }
    }
}

/// Strip trailing annotations such as `# entry point` or `<- config`.
fn strip_comment(name: &str) -> &str {
    let mut end = name.len();
    for marker in [" #", "  ", " <-", " ←", " //"] {
        if let Some(i) = name.find(marker) {
            end = end.min(i);
        }
    }
    name[..end].trim()
}

fn column_of(prefix: &str) -> usize {
    prefix.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// Parse `text` into entries in document order. Paths that would escape the
/// root (`..`, absolute) are dropped.
pub fn parse_tree(text: &str) -> Vec<TreeEntry> {
    // (column, name, explicit dir)
    let mut raw: Vec<(usize, String, bool)> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with("```") {
            continue;
        }
        let Some(start) = name_start(line) else {
            continue;
        };
        let name = strip_comment(&line[start..]);
        if name.is_empty() {
            continue;
        }
        let explicit_dir = name.ends_with('/');
        let name = name.trim_end_matches('/').to_string();
        if name.is_empty() || name == "." {
            continue;
        }
        raw.push((column_of(&line[..start]), name, explicit_dir));
    }

    let mut entries = Vec::with_capacity(raw.len());
    let mut stack: Vec<(usize, String)> = Vec::new();

    for (i, (column, name, explicit_dir)) in raw.iter().enumerate() {
        while stack.last().is_some_and(|(c, _)| c >= column) {
            stack.pop();
        }
        let has_children = raw.get(i + 1).is_some_and(|(next, _, _)| next > column);
        let is_dir = *explicit_dir || has_children;

        let path = match stack.last() {
            Some((_, parent)) => format!("{parent}/{name}"),
            None => name.clone(),
        };
        if !is_safe_relative(&path) {
            continue;
        }
        if is_dir {
            stack.push((*column, path.clone()));
        }
        entries.push(TreeEntry { path, is_dir });
    }
    entries
}

fn is_safe_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

/// Create every entry under `root`. Existing files are left untouched.
/// Returns what was created, in tree order.
pub async fn create_tree(root: &Path, entries: &[TreeEntry]) -> std::io::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(root).await?;
    let mut created = Vec::new();
    for entry in entries {
        let target = root.join(&entry.path);
        if entry.is_dir {
            if !target.is_dir() {
                tokio::fs::create_dir_all(&target).await?;
                created.push(target);
            }
        } else if !target.exists() {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, "").await?;
            created.push(target);
        }
    }
    Ok(created)
}
