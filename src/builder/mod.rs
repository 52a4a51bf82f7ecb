// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Workflow configuration builder
//!
//! The fluent API pipelines use to declare what CI should do for them:
//!
//! ```
//! use pipescaffold::builder::{Branches, WorkflowConfig};
//!
//! let config = WorkflowConfig::new()
//!     .add_input("build-command", "Command to run", false, Some("cargo build".into()))
//!     .on_push(Branches::default())
//!     .on_schedule("0 3 * * *")
//!     .cache_cargo("**/Cargo.lock")
//!     .build();
//!
//! assert!(config.inputs.contains_key("build-command"));
//! ```

mod setup;
mod trigger;

pub use setup::SetupBuilder;
pub use trigger::{Branches, TriggerBuilder};

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::pipeline::{
    canonical_key, DescriptorConfig, EnvMap, InputMap, InputSpec, JobMap, JobSpec,
    DEFAULT_RUNS_ON, DEFAULT_RUNTIME_VERSION,
};

/// Fluent builder for a pipeline's workflow configuration
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    inputs: InputMap,
    setup: SetupBuilder,
    triggers: TriggerBuilder,
    env: EnvMap,
    runs_on: String,
    runtime_version: String,
    dependencies: Vec<String>,
    jobs: JobMap,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            inputs: InputMap::new(),
            setup: SetupBuilder::new(),
            triggers: TriggerBuilder::new(),
            env: EnvMap::new(),
            runs_on: DEFAULT_RUNS_ON.to_string(),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_string(),
            dependencies: Vec::new(),
            jobs: JobMap::new(),
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Declare an input; the key is stored in canonical kebab-case
    pub fn add_input(
        mut self,
        name: &str,
        description: &str,
        required: bool,
        default: Option<Value>,
    ) -> Self {
        self.inputs.insert(
            canonical_key(name),
            InputSpec::new(description, required, default),
        );
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Setup
    // ─────────────────────────────────────────────────────────────────────────

    pub fn setup_python(mut self, version: &str, cache: Option<&str>) -> Self {
        self.setup = self.setup.setup_python(version, cache);
        self.runtime_version = version.to_string();
        self
    }

    pub fn setup_node(mut self, version: &str, cache: Option<&str>) -> Self {
        self.setup = self.setup.setup_node(version, cache);
        self
    }

    pub fn setup_java(mut self, version: &str, distribution: &str, cache: Option<&str>) -> Self {
        self.setup = self.setup.setup_java(version, distribution, cache);
        self
    }

    pub fn setup_flutter(mut self, version: &str, channel: &str, cache: bool) -> Self {
        self.setup = self.setup.setup_flutter(version, channel, cache);
        self
    }

    pub fn setup_rust(mut self, toolchain: &str, components: &[&str]) -> Self {
        self.setup = self.setup.setup_rust(toolchain, components);
        self
    }

    pub fn add_setup_action(mut self, name: &str, uses: &str, with: IndexMap<String, Value>) -> Self {
        self.setup = self.setup.add_action(name, uses, with);
        self
    }

    pub fn add_setup_step(mut self, name: &str, run: &str) -> Self {
        self.setup = self.setup.add_step(name, run);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Caches
    // ─────────────────────────────────────────────────────────────────────────

    pub fn cache_pip(mut self, key_file: &str) -> Self {
        self.setup = self.setup.cache_pip(key_file);
        self
    }

    pub fn cache_npm(mut self, key_file: &str) -> Self {
        self.setup = self.setup.cache_npm(key_file);
        self
    }

    pub fn cache_gradle(mut self, key_files: &[&str]) -> Self {
        self.setup = self.setup.cache_gradle(key_files);
        self
    }

    pub fn cache_cargo(mut self, key_file: &str) -> Self {
        self.setup = self.setup.cache_cargo(key_file);
        self
    }

    pub fn add_cache(mut self, name: &str, path: &str, key: &str, restore_keys: Vec<String>) -> Self {
        self.setup = self.setup.add_cache(name, path, key, restore_keys);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Triggers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on_push(mut self, branches: impl Into<Branches>) -> Self {
        self.triggers = self.triggers.on_push(branches);
        self
    }

    pub fn on_pull_request(mut self, branches: impl Into<Branches>) -> Self {
        self.triggers = self.triggers.on_pull_request(branches);
        self
    }

    pub fn on_release<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = self.triggers.on_release(types);
        self
    }

    pub fn on_schedule(mut self, cron: &str) -> Self {
        self.triggers = self.triggers.on_schedule(cron);
        self
    }

    pub fn on_workflow_dispatch(mut self, inputs: InputMap) -> Self {
        self.triggers = self.triggers.on_workflow_dispatch(inputs);
        self
    }

    /// Manual dispatch offering every input declared so far
    pub fn on_workflow_dispatch_with_inputs(self) -> Self {
        let inputs = self.inputs.clone();
        self.on_workflow_dispatch(inputs)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Environment
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_runs_on(mut self, runs_on: &str) -> Self {
        self.runs_on = runs_on.to_string();
        self
    }

    pub fn set_runtime_version(mut self, version: &str) -> Self {
        self.runtime_version = version.to_string();
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Dependencies and jobs
    // ─────────────────────────────────────────────────────────────────────────

    /// Pipelines whose workflows must succeed first
    pub fn depends_on<I, S>(mut self, pipelines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(pipelines.into_iter().map(Into::into));
        self
    }

    /// Add a job to a composite workflow; a job with the same name is replaced
    pub fn add_job(mut self, name: &str, job: JobSpec) -> Self {
        self.jobs.insert(name.to_string(), job);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Output
    // ─────────────────────────────────────────────────────────────────────────

    /// Flatten into a descriptor body, leaving out empty and default values
    pub fn build(&self) -> DescriptorConfig {
        DescriptorConfig {
            inputs: self.inputs.clone(),
            setup: self.setup.build(),
            triggers: self.triggers.build(),
            env: self.env.clone(),
            runs_on: non_default(&self.runs_on, DEFAULT_RUNS_ON),
            runtime_version: non_default(&self.runtime_version, DEFAULT_RUNTIME_VERSION),
            dependencies: self.dependencies.clone(),
            jobs: self.jobs.clone(),
        }
    }
}

fn non_default(value: &str, default: &str) -> Option<String> {
    (value != default).then(|| value.to_string())
}
