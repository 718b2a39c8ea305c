//! Configuration management.
//!
//! Everything the planners read comes from a [`PlanConfig`]. Defaults are
//! applied here, at load time, so planners never see missing values.

use crate::error::{PlanError, Result};
use crate::image::ImageTarget;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LAYERPLAN_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "layerplan.json";

pub const PYPI_INDEX: &str = "https://pypi.org/simple/";

/// Python resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonSetup {
    /// Lockfile-based resolution; not supported by any planner
    pub enable_resolves: bool,
    /// Global pip constraint file, relative to the source root
    pub requirement_constraints: Option<String>,
}

/// Package sources pip may install from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonRepos {
    /// Find-links style repositories
    pub repos: Vec<String>,
    /// Index URLs; the first is primary
    pub indexes: Vec<String>,
}

impl Default for PythonRepos {
    fn default() -> Self {
        Self { repos: Vec::new(), indexes: vec![PYPI_INDEX.to_string()] }
    }
}

impl PythonRepos {
    /// No find-links and no indexes.
    pub fn offline() -> Self {
        Self { repos: Vec::new(), indexes: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerOptions {
    /// One pip install layer per requirement
    pub multiline_pip_install: bool,
}

/// Complete planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub python: PythonSetup,
    pub repos: PythonRepos,
    pub docker: DockerOptions,
    pub image: Option<ImageTarget>,
}

impl PlanConfig {
    /// Resolve which config file to read.
    ///
    /// Resolution order:
    /// 1. `explicit` argument
    /// 2. `LAYERPLAN_CONFIG` environment variable
    /// 3. `layerplan.json` in the working directory
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration, falling back to defaults when no file exists.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::config_path(explicit);
        if !path.exists() {
            if explicit.is_some() {
                return Err(PlanError::InvalidConfig {
                    reason: format!("Config file not found: {}", path.display()),
                });
            }
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| PlanError::InvalidConfig {
            reason: format!("Failed to read config {}: {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "Loaded config");
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| PlanError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PlanError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| PlanError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content).map_err(|e| PlanError::io(path, e))
    }
}
