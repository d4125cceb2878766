//! Data models for package specifications.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// File extension of spec files, without the leading dot.
pub const SPEC_EXTENSION: &str = "pkgspec";

/// Host name the stub generator writes into homepage and source URLs.
pub const STUB_HOST: &str = "EXAMPLE";

/// Summary text written by the stub generator for `name`.
pub fn stub_summary(name: &str) -> String {
    format!("A short description of {}.", name)
}

/// Description text written by the stub generator for `name`.
pub fn stub_description(name: &str) -> String {
    format!("An optional longer description of {}.", name)
}

/// A package specification as loaded from disk.
///
/// Every field is optional at the parsing level so that a half-written spec
/// still loads and can be reported on rule by rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Specification {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub license: License,
    #[serde(default)]
    pub authors: Authors,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub source_files: PlatformFiles,
    /// Per-platform opt-out of manual memory management.
    #[serde(default)]
    pub requires_arc: BTreeMap<String, bool>,
}

impl Specification {
    /// Platforms in declaration order.
    pub fn platforms(&self) -> impl Iterator<Item = &PlatformPatterns> {
        self.source_files.iter()
    }

    /// Declared patterns for a platform, if the platform is declared.
    pub fn patterns_for(&self, platform: &str) -> Option<&[String]> {
        self.source_files
            .iter()
            .find(|p| p.platform == platform)
            .map(|p| p.patterns.as_slice())
    }

    /// Whether the platform opts out of manual memory management.
    pub fn requires_arc(&self, platform: &str) -> bool {
        self.requires_arc.get(platform).copied().unwrap_or(false)
    }

    /// Whether `version` is a semantic version (`1`, `1.3`, `0.0.1`, `2.0.0-beta.1`).
    pub fn has_valid_version(&self) -> bool {
        static SEMVER: OnceLock<Regex> = OnceLock::new();
        let re = SEMVER.get_or_init(|| {
            Regex::new(r"^\d+(\.\d+){0,2}(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")
                .expect("semver pattern is valid")
        });
        re.is_match(self.version.as_str().trim())
    }
}

/// Declared version text.
///
/// YAML reads an unquoted `1.10` as the number `1.1`, so the version keeps
/// track of whether it was written as a number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    text: String,
    numeric: bool,
}

impl Version {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the version was read from an unquoted YAML number.
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            numeric: false,
        }
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringLike {
            Str(String),
            Int(i64),
            Float(f64),
        }

        let (text, numeric) = match Option::<StringLike>::deserialize(deserializer)? {
            Some(StringLike::Str(s)) => (s, false),
            Some(StringLike::Int(i)) => (i.to_string(), true),
            Some(StringLike::Float(f)) => (f.to_string(), true),
            None => (String::new(), false),
        };
        Ok(Self { text, numeric })
    }
}

/// License declaration.
///
/// Accepts either a bare type (`license: MIT`) or a mapping with `type`,
/// `file` and `text` keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "LicenseDef")]
pub struct License {
    #[serde(rename = "type")]
    pub kind: String,
    pub file: Option<String>,
    pub text: Option<String>,
}

impl License {
    pub fn has_file(&self) -> bool {
        self.file.as_deref().is_some_and(|f| !f.trim().is_empty())
    }

    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LicenseDef {
    Type(String),
    Full {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        file: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
}

impl From<LicenseDef> for License {
    fn from(def: LicenseDef) -> Self {
        match def {
            LicenseDef::Type(kind) => Self {
                kind,
                file: None,
                text: None,
            },
            LicenseDef::Full { kind, file, text } => Self { kind, file, text },
        }
    }
}

/// Authors, as a single name, a list of names, or a name to contact mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Authors {
    Single(String),
    Names(Vec<String>),
    Contacts(BTreeMap<String, Option<String>>),
}

impl Default for Authors {
    fn default() -> Self {
        Authors::Names(Vec::new())
    }
}

impl Authors {
    /// Author names, skipping blank entries.
    pub fn names(&self) -> Vec<&str> {
        let names: Vec<&str> = match self {
            Authors::Single(name) => vec![name.as_str()],
            Authors::Names(names) => names.iter().map(String::as_str).collect(),
            Authors::Contacts(contacts) => contacts.keys().map(String::as_str).collect(),
        };
        names.into_iter().filter(|n| !n.trim().is_empty()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

/// Declared source location: a git repository plus exactly one reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    #[serde(default)]
    pub git: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Source {
    /// Source pinned to a tag.
    pub fn tagged(git: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    /// The single git reference, or `None` when zero or several are set.
    pub fn reference(&self) -> Option<GitReference> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        let refs: Vec<GitReference> = [
            non_empty(&self.tag).map(GitReference::Tag),
            non_empty(&self.commit).map(GitReference::Commit),
            non_empty(&self.branch).map(GitReference::Branch),
        ]
        .into_iter()
        .flatten()
        .collect();

        match refs.as_slice() {
            [single] => Some(single.clone()),
            _ => None,
        }
    }

    /// Number of references declared (tag, commit, branch).
    pub fn reference_count(&self) -> usize {
        [&self.tag, &self.commit, &self.branch]
            .iter()
            .filter(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
            .count()
    }
}

/// A git reference to check out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitReference {
    Tag(String),
    Commit(String),
    Branch(String),
}

impl fmt::Display for GitReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitReference::Tag(t) => write!(f, "tag {}", t),
            GitReference::Commit(c) => write!(f, "commit {}", c),
            GitReference::Branch(b) => write!(f, "branch {}", b),
        }
    }
}

/// Source file patterns for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPatterns {
    pub platform: String,
    pub patterns: Vec<String>,
}

/// Platform to patterns mapping that keeps declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFiles(Vec<PlatformPatterns>);

impl PlatformFiles {
    pub fn iter(&self) -> std::slice::Iter<'_, PlatformPatterns> {
        self.0.iter()
    }

    /// Append patterns for a platform, merging into an existing entry.
    pub fn insert(&mut self, platform: impl Into<String>, patterns: Vec<String>) {
        let platform = platform.into();
        match self.0.iter_mut().find(|p| p.platform == platform) {
            Some(existing) => existing.patterns.extend(patterns),
            None => self.0.push(PlatformPatterns { platform, patterns }),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for PlatformFiles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlatformFilesVisitor;

        impl<'de> Visitor<'de> for PlatformFilesVisitor {
            type Value = PlatformFiles;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping from platform to source file patterns")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(PlatformFiles::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut files = PlatformFiles::default();
                while let Some((platform, patterns)) = map.next_entry::<String, Option<OneOrMany>>()? {
                    let patterns = match patterns {
                        Some(OneOrMany::One(p)) => vec![p],
                        Some(OneOrMany::Many(ps)) => ps,
                        None => Vec::new(),
                    };
                    files.insert(platform, patterns);
                }
                Ok(files)
            }
        }

        deserializer.deserialize_map(PlatformFilesVisitor)
    }
}

impl Serialize for PlatformFiles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.platform, &entry.patterns)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Specification {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_platform_order_is_preserved() {
        let spec = parse(
            r#"
name: Multi
source_files:
  osx: "Mac/**/*.m"
  ios: [Classes, "Classes/**/*.{h,m}"]
  tvos: []
"#,
        );
        let order: Vec<_> = spec.platforms().map(|p| p.platform.as_str()).collect();
        assert_eq!(order, vec!["osx", "ios", "tvos"]);
        assert_eq!(spec.patterns_for("osx").unwrap(), &["Mac/**/*.m".to_string()]);
        assert_eq!(spec.patterns_for("ios").unwrap().len(), 2);
        assert!(spec.patterns_for("tvos").unwrap().is_empty());
    }

    #[test]
    fn test_insert_merges_platform_entries() {
        let mut files = PlatformFiles::default();
        files.insert("ios", vec!["Classes".into()]);
        files.insert("osx", vec!["Mac".into()]);
        files.insert("ios", vec!["Shared/*.m".into()]);

        let entries: Vec<_> = files.iter().map(|p| (p.platform.as_str(), p.patterns.len())).collect();
        assert_eq!(entries, vec![("ios", 2), ("osx", 1)]);
    }

    #[test]
    fn test_license_forms() {
        let bare = parse("license: MIT");
        assert_eq!(bare.license.kind, "MIT");
        assert!(!bare.license.has_file() && !bare.license.has_text());

        let full = parse("license:\n  type: MIT\n  file: LICENSE");
        assert!(full.license.has_file());

        let blank = parse("license:\n  type: MIT\n  text: '  '");
        assert!(!blank.license.has_text());
    }

    #[test]
    fn test_authors_forms() {
        assert_eq!(parse("authors: Jane").authors.names(), vec!["Jane"]);
        assert_eq!(parse("authors: [Jane, Joe]").authors.names().len(), 2);
        let contacts = parse("authors:\n  Jane: jane@example.com\n  Joe:");
        assert_eq!(contacts.authors.names(), vec!["Jane", "Joe"]);
        assert!(parse("name: X").authors.is_empty());
    }

    #[test]
    fn test_source_reference_requires_exactly_one() {
        let tagged = Source::tagged("https://example.com/x.git", "1.0");
        assert_eq!(tagged.reference(), Some(GitReference::Tag("1.0".into())));

        let none = Source {
            git: "https://example.com/x.git".into(),
            ..Default::default()
        };
        assert_eq!(none.reference(), None);

        let both = Source {
            commit: Some("abc".into()),
            ..tagged
        };
        assert_eq!(both.reference_count(), 2);
        assert_eq!(both.reference(), None);
    }

    #[test]
    fn test_version_validation() {
        for valid in ["1", "1.3", "0.0.1", "2.0.0-beta.1", "1.0.0+build.5"] {
            let spec = Specification {
                version: valid.into(),
                ..Default::default()
            };
            assert!(spec.has_valid_version(), "{} should be valid", valid);
        }
        for invalid in ["", "v1.0", "1.2.3.4", "one"] {
            let spec = Specification {
                version: invalid.into(),
                ..Default::default()
            };
            assert!(!spec.has_valid_version(), "{} should be invalid", invalid);
        }
    }

    #[test]
    fn test_numeric_version_is_read_as_text() {
        assert_eq!(parse("version: 1.3").version, "1.3");
        assert_eq!(parse("version: 2").version, "2");
        assert_eq!(parse("version: '0.0.1'").version, "0.0.1");
    }

    #[test]
    fn test_unquoted_numeric_version_is_flagged() {
        let unquoted = parse("version: 1.10");
        assert_eq!(unquoted.version, "1.1");
        assert!(unquoted.version.is_numeric());
        assert!(parse("version: 2").version.is_numeric());

        let quoted = parse("version: '1.10'");
        assert_eq!(quoted.version, "1.10");
        assert!(!quoted.version.is_numeric());
        assert!(!parse("version: 0.0.1").version.is_numeric());
        assert!(!parse("name: X").version.is_numeric());
    }

    #[test]
    fn test_requires_arc_defaults_to_false() {
        let spec = parse("requires_arc:\n  ios: true");
        assert!(spec.requires_arc("ios"));
        assert!(!spec.requires_arc("osx"));
    }
}
