// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Project configuration
//!
//! Loaded from `pipescaffold.yaml` (or `config.yaml`) at the project root.
//! Every key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ScaffoldError;
use crate::pipeline::SearchScope;

/// File names tried, in order, at the project root
pub const CONFIG_FILE_NAMES: &[&str] = &["pipescaffold.yaml", "config.yaml"];

/// Files or directories that mark a project root
const ROOT_MARKERS: &[&str] = &["Cargo.toml", ".git"];

/// Project-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub scaffold: ScaffoldSettings,

    #[serde(default)]
    pub pipelines: DiscoverySettings,
}

/// Where and how workflows are generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldSettings {
    /// Output directory for workflow files, relative to the project root
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: PathBuf,

    /// Directory searched for per-pipeline override files
    #[serde(default = "default_sidecar_dir")]
    pub sidecar_dir: PathBuf,

    /// Command that runs this tool inside CI
    #[serde(default = "default_run_command")]
    pub run_command: String,

    #[serde(default = "default_checkout_action")]
    pub checkout_action: String,

    /// Shell commands run right after checkout, before any pipeline setup
    #[serde(default)]
    pub bootstrap_steps: Vec<BootstrapStep>,

    /// Module prefix stripped from registry provenance
    #[serde(default)]
    pub module_prefix: Option<String>,
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self {
            workflows_dir: default_workflows_dir(),
            sidecar_dir: default_sidecar_dir(),
            run_command: default_run_command(),
            checkout_action: default_checkout_action(),
            bootstrap_steps: Vec::new(),
            module_prefix: None,
        }
    }
}

/// A step inserted after checkout in every generated workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapStep {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    #[serde(default, rename = "with", skip_serializing_if = "indexmap::IndexMap::is_empty")]
    pub with: indexmap::IndexMap<String, serde_yaml::Value>,
}

/// Which registered pipelines are discoverable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default)]
    pub include_test_pipelines: bool,

    /// Module prefixes to search; empty searches everything
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_workflows_dir() -> PathBuf {
    PathBuf::from(".github/workflows")
}

fn default_sidecar_dir() -> PathBuf {
    PathBuf::from(".github/pipelines")
}

fn default_run_command() -> String {
    "cargo run --quiet --".to_string()
}

fn default_checkout_action() -> String {
    "actions/checkout@v4".to_string()
}

impl ProjectConfig {
    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ScaffoldError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ScaffoldError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ScaffoldError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from the first config file present at the project root
    ///
    /// A file that cannot be read or parsed is reported as a warning and
    /// the defaults are used instead.
    pub fn load_from_project(project_root: &Path) -> Self {
        let Some(path) = CONFIG_FILE_NAMES
            .iter()
            .map(|name| project_root.join(name))
            .find(|path| path.is_file())
        else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded project config");
                config
            }
            Err(e) => {
                tracing::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Search scope for discovery
    pub fn search_scope(&self) -> SearchScope {
        SearchScope {
            prefixes: self.pipelines.scopes.clone(),
            include_test: self.pipelines.include_test_pipelines,
        }
    }
}

/// Nearest ancestor of `start` that holds a `Cargo.toml` or `.git`
///
/// Falls back to `start` itself.
pub fn detect_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .unwrap_or(start)
        .to_path_buf()
}
