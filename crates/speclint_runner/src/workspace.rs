//! Transient per-spec workspaces.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::RunnerResult;

/// Temporary directory that holds one spec's fetched source.
///
/// The directory and everything below it is removed when the workspace is
/// dropped, whether the fetch or build succeeded or not.
#[derive(Debug)]
pub struct SourceWorkspace {
    dir: TempDir,
}

impl SourceWorkspace {
    /// Create a fresh workspace labelled after the spec being linted.
    pub fn create(label: &str) -> RunnerResult<Self> {
        let prefix = format!("speclint-{}-", sanitize(label));
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        debug!("Created workspace {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the source is checked out into.
    pub fn checkout_dir(&self) -> PathBuf {
        self.dir.path().join("source")
    }
}

impl Drop for SourceWorkspace {
    fn drop(&mut self) {
        debug!("Discarding workspace {:?}", self.dir.path());
    }
}

fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(40)
        .collect();
    if cleaned.is_empty() {
        "spec".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let workspace = SourceWorkspace::create("Bananas").unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::create_dir_all(workspace.checkout_dir()).unwrap();
        std::fs::write(workspace.checkout_dir().join("A.m"), "int a;").unwrap();
        assert!(path.exists());

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_label_is_sanitized() {
        let workspace = SourceWorkspace::create("../weird name/").unwrap();
        let name = workspace.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("speclint-___weird_name_-"));
        assert_eq!(sanitize(""), "spec");
    }
}
