//! YAML-backed configuration with serde defaults for every field, so a
//! partial file or no file at all still yields a working setup.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::executor::ExecutionMode;
use crate::matcher::SelectionStrategy;
use crate::team::TeamKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: usize,
    pub min_similarity: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            min_similarity: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enable_decomposition: bool,
    pub max_subtasks: usize,
    pub confidence_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enable_decomposition: true,
            max_subtasks: 10,
            confidence_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub default_kind: TeamKind,
    pub min_team_size: usize,
    pub max_team_size: usize,
    pub optimal_team_size: usize,
    pub strategy: SelectionStrategy,
    pub enable_role_assignment: bool,
    pub cache_ttl_secs: u64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            default_kind: TeamKind::Ephemeral,
            min_team_size: 1,
            max_team_size: 10,
            optimal_team_size: 3,
            strategy: SelectionStrategy::Similarity,
            enable_role_assignment: true,
            cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    pub timeout_secs: u64,
    pub retry_on_failure: bool,
    pub max_retries: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            timeout_secs: 300,
            retry_on_failure: true,
            max_retries: 2,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub analysis: AnalysisConfig,
    pub assembly: AssemblyConfig,
    pub execution: ExecutionConfig,
}

impl Config {
    /// Load from a YAML file. A missing file yields the defaults; a
    /// present but malformed file is an error.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, serde_yaml::Error> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_yaml::from_str(&contents),
            Err(err) => {
                log::debug!("config file {} not read ({err}), using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Look for `assembler.yaml` in the working directory, then fall
    /// back to defaults.
    pub fn from_default_locations() -> Self {
        match Self::from_yaml("assembler.yaml") {
            Ok(config) => config,
            Err(err) => {
                log::warn!("invalid assembler.yaml ({err}), using defaults");
                Self::default()
            }
        }
    }
}
