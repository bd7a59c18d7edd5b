//! Shell configuration
//!
//! Settings persist as TOML in the platform configuration directory:
//!
//! - **Linux**: `~/.config/sdb-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/sdb-rs/config.toml`
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//!
//! # Example
//!
//! ```no_run
//! use sdb_rs::config::ShellConfig;
//!
//! let config = ShellConfig::load_or_default(None);
//! println!("prompt is {:?}", config.prompt);
//! ```

use crate::error::{Result, SdbError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application directory name under the platform config dir
pub const APP_DIR: &str = "sdb-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default tracing filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "warn,sdb_rs=info";

/// Default interactive prompt
pub const DEFAULT_PROMPT: &str = "> ";

/// Path of the user's config file, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt printed before each interactive line
    pub prompt: String,
    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
    /// Shell that runs the command after `!`
    pub shell: String,
    /// Snapshot loaded when none is given on the command line
    pub snapshot: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            shell: crate::pipeline::session::DEFAULT_SHELL.to_string(),
            snapshot: None,
        }
    }
}

impl ShellConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SdbError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        toml::from_str(&content).map_err(|e| {
            SdbError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults silently; an unreadable one yields
    /// them with a warning.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return Self::default(),
        };
        if !path.exists() {
            tracing::debug!("no config at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SdbError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SdbError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            SdbError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.log_filter, "warn,sdb_rs=info");
        assert_eq!(config.shell, "/bin/sh");
        assert!(config.snapshot.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ShellConfig {
            prompt: "sdb> ".to_string(),
            snapshot: Some(PathBuf::from("/tmp/core.toml")),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ShellConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "shell = \"/bin/bash\"\n").unwrap();
        let config = ShellConfig::load(&path).unwrap();
        assert_eq!(config.shell, "/bin/bash");
        assert_eq!(config.prompt, "> ");
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "prompt = [").unwrap();
        assert!(ShellConfig::load(&path).is_err());
        assert_eq!(ShellConfig::load_or_default(Some(&path)), ShellConfig::default());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(ShellConfig::load_or_default(Some(&path)), ShellConfig::default());
    }
}
