//! Spec file reading and discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{SpecError, SpecResult};
use crate::models::{Specification, SPEC_EXTENSION};

/// A spec together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub path: PathBuf,
    pub spec: Specification,
}

impl LoadedSpec {
    /// Base name of the spec file without its extension.
    pub fn file_stem(&self) -> String {
        file_stem(&self.path)
    }
}

/// Base name of a spec path without its extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Reader for spec files.
pub struct SpecReader;

impl SpecReader {
    /// Whether a path looks like a spec file.
    pub fn is_spec_file(path: &Path) -> bool {
        path.is_file() && path.extension().map_or(false, |ext| ext == SPEC_EXTENSION)
    }

    /// Read and parse a spec file.
    pub fn read_spec(path: impl AsRef<Path>) -> SpecResult<LoadedSpec> {
        let path = path.as_ref();
        debug!("Reading spec from {:?}", path);

        if !path.exists() {
            return Err(SpecError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse_spec(&content, path)
    }

    /// Parse spec content that was read from `path`.
    pub fn parse_spec(content: &str, path: impl AsRef<Path>) -> SpecResult<LoadedSpec> {
        let path = path.as_ref();
        let spec: Specification =
            serde_yaml::from_str(content).map_err(|e| SpecError::InvalidFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(LoadedSpec {
            path: path.to_path_buf(),
            spec,
        })
    }

    /// Recursively find spec files below `dir`, sorted by path.
    pub fn discover(dir: impl AsRef<Path>) -> SpecResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SpecError::NotFound(dir.to_path_buf()));
        }

        let mut specs: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden(e.path(), dir))
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| Self::is_spec_file(p))
            .collect();
        specs.sort();

        debug!("Discovered {} specs under {:?}", specs.len(), dir);
        Ok(specs)
    }

    /// Find spec files directly inside `dir` (no recursion), sorted by path.
    pub fn discover_shallow(dir: impl AsRef<Path>) -> SpecResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut specs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if Self::is_spec_file(&path) {
                specs.push(path);
            }
        }
        specs.sort();
        Ok(specs)
    }
}

// Skips `.git` and friends inside spec repositories, but never the root itself.
fn is_hidden(path: &Path, root: &Path) -> bool {
    path != root
        && path
            .file_name()
            .map_or(false, |n| n.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_error_is_invalid_format() {
        let err = SpecReader::parse_spec("name: [unclosed", "Broken.pkgspec").unwrap_err();
        assert!(matches!(err, SpecError::InvalidFormat { .. }));
        assert!(err.to_string().contains("Broken.pkgspec"));
    }

    #[test]
    fn test_file_stem_is_case_preserving() {
        let loaded = SpecReader::parse_spec("name: JSONKit", "/specs/JSONKit.pkgspec").unwrap();
        assert_eq!(loaded.file_stem(), "JSONKit");
    }

    #[test]
    fn test_discover_skips_hidden_and_other_files() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("B/1.0")).unwrap();
        fs::create_dir_all(root.join("A/2.0")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("B/1.0/B.pkgspec"), "name: B").unwrap();
        fs::write(root.join("A/2.0/A.pkgspec"), "name: A").unwrap();
        fs::write(root.join(".git/Hidden.pkgspec"), "name: Hidden").unwrap();
        fs::write(root.join("A/README.md"), "# A").unwrap();

        let found = SpecReader::discover(root).unwrap();
        let names: Vec<_> = found.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["A", "B"]);

        assert!(SpecReader::discover_shallow(root).unwrap().is_empty());
        assert_eq!(SpecReader::discover_shallow(root.join("A/2.0")).unwrap().len(), 1);
    }
}
