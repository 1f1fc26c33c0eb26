//! Build context file resolution
//!
//! Walks the context directory and keeps every file matched by at least
//! one glob pattern.
//!
//! # Pattern dialect
//!
//! Patterns use the `glob` crate syntax, matched against `/`-separated
//! paths relative to the context root:
//!
//! - `*` and `?` match within a single path component
//! - `**` as a whole component matches zero or more directories
//! - `[abc]`, `[a-z]`, `[!a]` match character classes
//!
//! Brace expansion (`{a,b}`) is not supported.

use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compile patterns, dropping (and reporting) any that are malformed
fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignoring invalid pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

/// Find all files under `root` that match any of `patterns`.
///
/// Returns relative, `/`-separated paths in lexical walk order (parents
/// before children). A missing root yields an empty list.
pub fn resolve_files(root: &Path, patterns: &[String]) -> Vec<String> {
    if !root.exists() {
        debug!("Context root {} does not exist", root.display());
        return Vec::new();
    }

    let compiled = compile_patterns(patterns);
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }

        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };

        if compiled
            .iter()
            .any(|p| p.matches_with(&relative, MATCH_OPTIONS))
        {
            files.push(relative);
        }
    }

    debug!("Resolved {} context files", files.len());
    files
}

/// Path of `path` relative to `root`, joined with `/` on every platform
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
