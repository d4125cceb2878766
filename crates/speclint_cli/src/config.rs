//! Session configuration: defaults, then the TOML file, then flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use speclint_lint::SessionConfig;
use speclint_runner::BuildConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{0}")]
    Invalid(String),
}

/// Contents of a `--config` file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub repos_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub fetch_timeout_secs: Option<u64>,
    pub build: Option<BuildConfig>,
}

impl FileConfig {
    /// Load a config file. A relative `repos_dir` is taken relative to the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::parse(&content, path)?;
        if let (Some(dir), Some(base)) = (file.repos_dir.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(file)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub repos_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
}

/// Layer file values and overrides on top of the defaults. Relative paths
/// left after loading are taken relative to `working_dir`.
pub fn session_config(
    working_dir: &Path,
    file: FileConfig,
    overrides: Overrides,
) -> Result<SessionConfig, ConfigError> {
    let mut config = SessionConfig::new(working_dir);

    if let Some(dir) = overrides.repos_dir.or(file.repos_dir) {
        config = config.with_repos_dir(working_dir.join(dir));
    }

    let concurrency = overrides.concurrency.or(file.concurrency).unwrap_or(config.concurrency);
    if concurrency == 0 {
        return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()));
    }
    config = config.with_concurrency(concurrency);

    if let Some(secs) = file.fetch_timeout_secs {
        config = config.with_fetch_timeout(Duration::from_secs(secs));
    }
    if let Some(build) = file.build {
        if build.program.trim().is_empty() {
            return Err(ConfigError::Invalid("build.program must not be empty".to_string()));
        }
        config = config.with_build(build);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EXAMPLE: &str = r#"
repos_dir = "/var/specs"
concurrency = 8
fetch_timeout_secs = 120

[build]
program = "make"
args = ["lint-build"]
"#;

    #[test]
    fn test_parse_file_config() {
        let file = FileConfig::parse(EXAMPLE, Path::new("speclint.toml")).unwrap();
        assert_eq!(file.repos_dir, Some(PathBuf::from("/var/specs")));
        assert_eq!(file.concurrency, Some(8));
        let build = file.build.unwrap();
        assert_eq!(build.program, "make");
        assert_eq!(build.args, vec!["lint-build"]);
        assert_eq!(build.timeout_secs, 600);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = FileConfig::parse("paralelism = 3", Path::new("speclint.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig::parse(EXAMPLE, Path::new("speclint.toml")).unwrap();
        let overrides = Overrides {
            repos_dir: Some(PathBuf::from("repos")),
            concurrency: Some(2),
        };
        let config = session_config(Path::new("/work"), file, overrides).unwrap();

        assert_eq!(config.repos_dir, Some(PathBuf::from("/work/repos")));
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.fetch_timeout, Duration::from_secs(120));
        assert!(config.build.is_some());
    }

    #[test]
    fn test_relative_repos_dir_follows_config_file() {
        let temp = tempdir().unwrap();
        let conf_dir = temp.path().join("conf");
        fs::create_dir_all(&conf_dir).unwrap();
        let path = conf_dir.join("speclint.toml");
        fs::write(&path, "repos_dir = \"specs\"").unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.repos_dir, Some(conf_dir.join("specs")));

        let config = session_config(Path::new("/work"), file, Overrides::default()).unwrap();
        assert_eq!(config.repos_dir, Some(conf_dir.join("specs")));

        let from_flag = Overrides {
            repos_dir: Some(PathBuf::from("repos")),
            ..Default::default()
        };
        let config = session_config(Path::new("/work"), FileConfig::load(&path).unwrap(), from_flag).unwrap();
        assert_eq!(config.repos_dir, Some(PathBuf::from("/work/repos")));
    }

    #[test]
    fn test_missing_config_file() {
        let temp = tempdir().unwrap();
        let err = FileConfig::load(&temp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_defaults() {
        let config =
            session_config(Path::new("/work"), FileConfig::default(), Overrides::default()).unwrap();
        assert_eq!(config.working_dir, PathBuf::from("/work"));
        assert_eq!(config.repos_dir, None);
        assert_eq!(config.concurrency, 4);
        assert!(config.build.is_none());
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let overrides = Overrides {
            concurrency: Some(0),
            ..Default::default()
        };
        let err = session_config(Path::new("/work"), FileConfig::default(), overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
