//! Optional per-repository configuration read from `.upmerge.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name looked up at the repository root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = ".upmerge.toml";

/// Upgrade configuration (TOML).
///
/// Every field is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UpmergeConfig {
    /// Program used for every version-control command.
    pub git_binary: String,

    /// Kill any single git command running longer than this. Unset waits
    /// forever.
    pub command_timeout_secs: Option<u64>,

    /// Refuse to start unless `git status` is empty.
    pub require_clean: bool,
}

impl Default for UpmergeConfig {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
            command_timeout_secs: None,
            require_clean: false,
        }
    }
}

impl UpmergeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.git_binary.trim().is_empty() {
            return Err(anyhow!("git_binary must be non-empty"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Default config location for a repository.
pub fn default_config_path(repo: &Path) -> PathBuf {
    repo.join(CONFIG_FILE_NAME)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `UpmergeConfig::default()`.
pub fn load_config(path: &Path) -> Result<UpmergeConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(UpmergeConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: UpmergeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), ?cfg, "config loaded");
    Ok(cfg)
}
