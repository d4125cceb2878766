//! Integration tests for spec loading.

use std::fs;
use tempfile::tempdir;

use speclint_spec::{Authors, GitReference, SpecError, SpecReader};

const BANANAS: &str = r#"
name: Bananas
version: 0.0.1
summary: A short description of Bananas.
description: An optional longer description of Bananas.
homepage: http://EXAMPLE/Bananas
license:
  type: MIT
  file: LICENSE
authors:
  Jane Doe: jane@example.com
source:
  git: http://EXAMPLE/Bananas.git
  tag: 0.0.1
source_files:
  ios: [Classes, "Classes/**/*.{h,m}"]
requires_arc:
  ios: true
"#;

/// Test loading a complete spec from disk.
#[test]
fn test_read_complete_spec() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Bananas.pkgspec");
    fs::write(&path, BANANAS).unwrap();

    let loaded = SpecReader::read_spec(&path).unwrap();
    let spec = &loaded.spec;

    assert_eq!(loaded.file_stem(), "Bananas");
    assert_eq!(spec.name, "Bananas");
    assert_eq!(spec.version, "0.0.1");
    assert!(spec.has_valid_version());
    assert_eq!(spec.license.kind, "MIT");
    assert_eq!(spec.license.file.as_deref(), Some("LICENSE"));
    assert!(matches!(spec.authors, Authors::Contacts(_)));
    assert_eq!(
        spec.source.as_ref().and_then(|s| s.reference()),
        Some(GitReference::Tag("0.0.1".into()))
    );
    assert_eq!(
        spec.patterns_for("ios").unwrap(),
        &["Classes".to_string(), "Classes/**/*.{h,m}".to_string()]
    );
    assert!(spec.requires_arc("ios"));
}

/// Test that a missing file is reported as not found.
#[test]
fn test_read_missing_spec() {
    let temp = tempdir().unwrap();
    let err = SpecReader::read_spec(temp.path().join("Nope.pkgspec")).unwrap_err();
    assert!(matches!(err, SpecError::NotFound(_)));
}

/// Test that a malformed document is a format error, not a panic.
#[test]
fn test_read_malformed_spec() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("Broken.pkgspec");
    fs::write(&path, "name: Broken\nsource_files: [not, a, mapping]\n").unwrap();

    let err = SpecReader::read_spec(&path).unwrap_err();
    assert!(matches!(err, SpecError::InvalidFormat { .. }));
}

/// Test that loaded specs serialize back with platforms in order.
#[test]
fn test_spec_serializes_platforms_in_order() {
    let loaded = SpecReader::parse_spec(
        "name: X\nsource_files:\n  osx: a\n  ios: b\n",
        "X.pkgspec",
    )
    .unwrap();
    let json = serde_json::to_string(&loaded.spec.source_files).unwrap();
    assert_eq!(json, r#"{"osx":["a"],"ios":["b"]}"#);
}
