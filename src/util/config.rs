//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.colcon-rebar3/config.toml` - User-wide defaults
//! - Project: `.colcon-rebar3/config.toml` - Workspace-specific overrides
//!
//! Project config takes precedence over global config, and command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the directory holding configuration files.
pub const CONFIG_DIR_NAME: &str = ".colcon-rebar3";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// rebar3 invocation settings
    pub rebar3: Rebar3Config,

    /// Build settings
    pub build: BuildConfig,
}

/// rebar3 invocation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rebar3Config {
    /// Explicit path to the rebar3 executable
    pub command: Option<PathBuf>,

    /// Extra arguments for `rebar3 compile`. An empty list clears a
    /// lower-precedence setting.
    pub build_args: Option<Vec<String>>,

    /// Extra arguments for `rebar3 release`
    pub release_args: Option<Vec<String>>,
}

/// Build settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Do not write environment scripts after install
    pub skip_hook_creation: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.rebar3.command.is_some() {
            self.rebar3.command = other.rebar3.command;
        }
        // Argument lists are replaced, not concatenated
        if other.rebar3.build_args.is_some() {
            self.rebar3.build_args = other.rebar3.build_args;
        }
        if other.rebar3.release_args.is_some() {
            self.rebar3.release_args = other.rebar3.release_args;
        }

        if other.build.skip_hook_creation.is_some() {
            self.build.skip_hook_creation = other.build.skip_hook_creation;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.colcon-rebar3/config.toml)
/// 2. Global config (~/.colcon-rebar3/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global config directory (~/.colcon-rebar3).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.colcon-rebar3/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.colcon-rebar3/config.toml).
pub fn project_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_DIR_NAME).join("config.toml")
}
