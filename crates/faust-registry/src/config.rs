//! Publisher configuration.
//!
//! Every path and remote used by the flows is carried here explicitly, so
//! the synchronizer and publish gate can run against temporary directories.
//!
//! ```toml
//! working_root = "/home/me/.faust"
//! registry_url = "https://github.com/example/registry.git"
//! libraries_repo_url = "https://github.com/grame-cncm/faustlibraries.git"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Default upstream library collection.
pub const DEFAULT_LIBRARIES_REPO_URL: &str = "https://github.com/shehab299/faustlibraries.git";

/// Default account service endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Configuration for one publisher installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Local working root holding the registry checkout and downloads.
    pub working_root: PathBuf,
    /// Remote URL of the registry repository. Has no default.
    pub registry_url: String,
    /// Remote URL of the flat library collection.
    pub libraries_repo_url: String,
    /// Base URL of the account service REST API.
    pub api_base: String,
    /// Faust compiler executable.
    pub compiler: String,
    /// Git executable.
    pub git: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            working_root: default_working_root(),
            registry_url: String::new(),
            libraries_repo_url: DEFAULT_LIBRARIES_REPO_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            compiler: "faust".to_string(),
            git: "git".to_string(),
        }
    }
}

/// `~/.faust`, or `./.faust` when no home directory is known.
pub fn default_working_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".faust")
}

/// `config.toml` under the default working root.
pub fn default_config_path() -> PathBuf {
    default_working_root().join("config.toml")
}

impl RegistryConfig {
    /// Configuration rooted at `working_root` with default remotes.
    pub fn with_working_root(working_root: impl Into<PathBuf>) -> Self {
        RegistryConfig {
            working_root: working_root.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text.
    pub fn parse(s: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or [`default_config_path`] when it exists, or the
    /// defaults. A configured `working_root` does not move the file lookup.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(RegistryError::Config {
                        detail: format!("{} does not exist", path.display()),
                    });
                }
                path.to_path_buf()
            }
            None => default_config_path(),
        };

        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("libraries_repo_url", &self.libraries_repo_url),
            ("api_base", &self.api_base),
            ("compiler", &self.compiler),
            ("git", &self.git),
        ];
        for (field, value) in checks {
            if value.trim().is_empty() {
                return Err(RegistryError::Config {
                    detail: format!("{field} must not be empty"),
                });
            }
        }
        if self.working_root.as_os_str().is_empty() {
            return Err(RegistryError::Config {
                detail: "working_root must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Registry remote, which must be configured before any session opens.
    pub fn registry_remote(&self) -> Result<&str> {
        let url = self.registry_url.trim();
        if url.is_empty() {
            return Err(RegistryError::Config {
                detail: "registry_url is not configured".to_string(),
            });
        }
        Ok(url)
    }

    /// Local registry checkout.
    pub fn registry_path(&self) -> PathBuf {
        self.working_root.join(".reg")
    }

    /// Directory receiving downloaded repositories.
    pub fn downloads_path(&self) -> PathBuf {
        self.working_root.join(".downloads")
    }

    /// Advisory lock guarding the registry checkout.
    pub fn lock_path(&self) -> PathBuf {
        self.working_root.join(".reg.lock")
    }

    /// Create the working root and downloads directory.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.working_root)?;
        std::fs::create_dir_all(self.downloads_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = RegistryConfig::parse(
            r#"
working_root = "/srv/faust"
registry_url = "https://example.com/reg/registry.git"
libraries_repo_url = "https://example.com/grame/faustlibraries.git"
api_base = "https://api.example.com"
compiler = "/opt/faust/bin/faust"
git = "/usr/bin/git"
"#,
        )
        .unwrap();
        assert_eq!(config.registry_path(), PathBuf::from("/srv/faust/.reg"));
        assert_eq!(
            config.downloads_path(),
            PathBuf::from("/srv/faust/.downloads")
        );
        assert_eq!(config.compiler, "/opt/faust/bin/faust");
        assert_eq!(
            config.registry_remote().unwrap(),
            "https://example.com/reg/registry.git"
        );
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let config = RegistryConfig::parse("working_root = \"/tmp/x\"\n").unwrap();
        assert_eq!(config.libraries_repo_url, DEFAULT_LIBRARIES_REPO_URL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(matches!(
            config.registry_remote(),
            Err(RegistryError::Config { .. })
        ));
    }

    #[test]
    fn reject_unknown_and_empty_fields() {
        assert!(RegistryConfig::parse("registry = \"x\"\n").is_err());
        assert!(matches!(
            RegistryConfig::parse("git = \"\"\n"),
            Err(RegistryError::Config { .. })
        ));
    }

    #[test]
    fn load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RegistryConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "compiler = \"faust2\"\n").unwrap();
        assert_eq!(RegistryConfig::load(Some(&path)).unwrap().compiler, "faust2");
    }

    #[test]
    fn default_config_lives_in_default_working_root() {
        let path = default_config_path();
        assert_eq!(path.file_name().unwrap(), "config.toml");
        assert_eq!(path.parent().unwrap(), default_working_root());
        assert!(path.ends_with(".faust/config.toml"));
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig::with_working_root(dir.path().join("root"));
        config.ensure_dirs().unwrap();
        assert!(config.downloads_path().is_dir());
    }
}
