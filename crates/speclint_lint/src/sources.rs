//! Resolving `source_files` patterns against a fetched source tree.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files below `root` matched by any of `patterns`, relative to `root`,
/// sorted and without duplicates.
///
/// Patterns are globs relative to `root` with `{a,b}` alternation. A pattern
/// naming a directory matches every file beneath it. Version control
/// metadata is never matched.
pub fn resolve_patterns(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let set = build_set(patterns);
    let mut matched: Vec<PathBuf> = list_files(root)
        .into_iter()
        .filter(|f| set.is_match(f))
        .collect();

    matched.sort();
    matched.dedup();
    debug!("{} files matched {:?} under {:?}", matched.len(), patterns, root);
    matched
}

fn build_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        // The second glob covers files beneath a matched directory.
        for candidate in [pattern.to_string(), format!("{}/**", pattern)] {
            match GlobBuilder::new(&candidate).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => {
                    warn!("Ignoring invalid pattern '{}': {}", pattern, e);
                    break;
                }
            }
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Ignoring source patterns {:?}: {}", patterns, e);
        GlobSet::empty()
    })
}

fn list_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}
