//! Global configuration file support.
//!
//! Gantry reads user-wide defaults from `~/.gantry/config.toml`; anything a
//! project sets in its own `Gantry.toml` takes precedence. Only settings
//! that make sense machine-wide live here, most prominently the NDK
//! installation path shared by every project on the box.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// User-wide configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub ndk: NdkDefaults,
}

/// Machine-wide NDK defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NdkDefaults {
    /// NDK installation root; the `ANDROID_NDK_HOME` environment variable is
    /// consulted when neither this nor the project manifest supplies one.
    pub path: Option<PathBuf>,

    /// Local artifact repository root override.
    pub repository: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// The user-wide config file location, if a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".gantry").join("config.toml"))
    }

    /// Load the user-wide configuration.
    pub fn load_global() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[ndk]\npath = \"/opt/android-ndk\"\nrepository = \"/data/repo\"\n",
        )
        .unwrap();

        let config = GlobalConfig::load(&path).unwrap();
        assert_eq!(config.ndk.path.as_deref(), Some(Path::new("/opt/android-ndk")));
        assert_eq!(config.ndk.repository.as_deref(), Some(Path::new("/data/repo")));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = GlobalConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert!(config.ndk.path.is_none());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[ndk\nbroken").unwrap();

        let config = GlobalConfig::load_or_default(&path);
        assert!(config.ndk.path.is_none());
    }
}
