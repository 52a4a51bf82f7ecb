// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! The pipeline contract
//!
//! A pipeline validates and executes at run time, and describes its CI
//! requirements through associated functions that the generator reads
//! without constructing the pipeline.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::{
    EnvMap, InputMap, JobMap, SetupSpec, TriggerMap, DEFAULT_RUNS_ON, DEFAULT_RUNTIME_VERSION,
};
use super::inputs::PipelineInputs;
use crate::builder::WorkflowConfig;
use crate::errors::ScaffoldError;
use crate::runner::{CommandRunner, ShellRunner};

/// Outcome of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub message: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, serde_json::Value>,
}

impl PipelineResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            exit_code: 0,
            data: IndexMap::new(),
        }
    }

    /// A failure; an exit code of 0 is bumped to 1
    pub fn failure(message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            success: false,
            message: message.into(),
            exit_code: if exit_code == 0 { 1 } else { exit_code },
            data: IndexMap::new(),
        }
    }

    /// Attach an output value
    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// Everything a running pipeline may use
#[derive(Clone)]
pub struct PipelineContext {
    pub inputs: PipelineInputs,
    pub project_root: PathBuf,
    pub runner: Arc<dyn CommandRunner>,
}

impl PipelineContext {
    /// Context with a shell runner
    pub fn new(inputs: PipelineInputs, project_root: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            project_root: project_root.into(),
            runner: Arc::new(ShellRunner::new()),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn root(&self) -> &Path {
        &self.project_root
    }

    /// Run a command in the project root and fail on a non-zero exit
    pub async fn run_command(&self, command: &str) -> Result<String, ScaffoldError> {
        let output = self
            .runner
            .run(command, &self.project_root, &EnvMap::new())
            .await?
            .into_result(command)?;
        Ok(output.stdout)
    }
}

/// A unit of CI logic
///
/// Only [`execute`](Pipeline::execute) is required. The `workflow_*`
/// functions default to the matching part of
/// [`workflow_config`](Pipeline::workflow_config), so most pipelines
/// override that one function and nothing else.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Check inputs and preconditions before executing
    fn validate(&self, _ctx: &PipelineContext) -> bool {
        true
    }

    /// Do the work
    async fn execute(&self, ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError>;

    /// One-line description used in the descriptor
    fn description() -> Option<String>
    where
        Self: Sized,
    {
        None
    }

    /// The full workflow configuration of this pipeline
    fn workflow_config() -> WorkflowConfig
    where
        Self: Sized,
    {
        WorkflowConfig::new()
    }

    fn workflow_inputs() -> InputMap
    where
        Self: Sized,
    {
        Self::workflow_config().build().inputs
    }

    fn workflow_setup() -> SetupSpec
    where
        Self: Sized,
    {
        Self::workflow_config().build().setup
    }

    fn workflow_triggers() -> TriggerMap
    where
        Self: Sized,
    {
        Self::workflow_config().build().triggers
    }

    fn workflow_env() -> EnvMap
    where
        Self: Sized,
    {
        Self::workflow_config().build().env
    }

    fn workflow_runs_on() -> String
    where
        Self: Sized,
    {
        Self::workflow_config()
            .build()
            .runs_on
            .unwrap_or_else(|| DEFAULT_RUNS_ON.to_string())
    }

    fn workflow_runtime_version() -> String
    where
        Self: Sized,
    {
        Self::workflow_config()
            .build()
            .runtime_version
            .unwrap_or_else(|| DEFAULT_RUNTIME_VERSION.to_string())
    }

    fn workflow_dependencies() -> Vec<String>
    where
        Self: Sized,
    {
        Self::workflow_config().build().dependencies
    }

    fn workflow_jobs() -> JobMap
    where
        Self: Sized,
    {
        Self::workflow_config().build().jobs
    }
}

/// Validate, then execute
///
/// A failed validation or an error from `execute` becomes a failed result
/// with a non-zero exit code.
pub async fn run_pipeline(pipeline: &dyn Pipeline, ctx: &PipelineContext) -> PipelineResult {
    if !pipeline.validate(ctx) {
        return PipelineResult::failure("Validation failed", 1);
    }

    match pipeline.execute(ctx).await {
        Ok(result) if !result.success && result.exit_code == 0 => {
            PipelineResult { exit_code: 1, ..result }
        }
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Pipeline execution failed: {}", e);
            PipelineResult::failure(format!("Pipeline execution failed: {}", e), 1)
        }
    }
}
