// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Build pipeline

use async_trait::async_trait;

use crate::builder::WorkflowConfig;
use crate::errors::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{Pipeline, PipelineContext, PipelineRegistry, PipelineResult};

const BRANCHES: [&str; 2] = ["main", "develop"];

/// Builds the project and reports where the artifacts are
#[derive(Debug, Default)]
pub struct BuildPipeline;

#[async_trait]
impl Pipeline for BuildPipeline {
    async fn execute(&self, ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
        let setup = ctx.inputs.get_or("setup-command", "");
        if !setup.trim().is_empty() {
            tracing::info!(command = %setup, "preparing environment");
            ctx.run_command(setup).await?;
        }

        let build = ctx.inputs.get_or("build-command", "cargo build --release");
        tracing::info!(command = %build, "building");
        ctx.run_command(build).await?;

        let mut result = PipelineResult::success("Build finished");
        let artifact_path = ctx.inputs.get_or("artifact-path", "target/release");
        if ctx.root().join(artifact_path).exists() {
            result = result.with_data("artifact-path", artifact_path);
        } else {
            tracing::warn!(path = %artifact_path, "no build artifacts found");
        }
        Ok(result)
    }

    fn description() -> Option<String> {
        Some("Build the project".into())
    }

    fn workflow_config() -> WorkflowConfig {
        WorkflowConfig::new()
            .add_input("setup-command", "Command preparing the environment", false, Some("".into()))
            .add_input("build-command", "Build command", false, Some("cargo build --release".into()))
            .add_input("artifact-path", "Where the build leaves its artifacts", false, Some("target/release".into()))
            .setup_rust("stable", &[])
            .cache_cargo("**/Cargo.lock")
            .on_push(BRANCHES)
            .on_pull_request(BRANCHES)
            .on_workflow_dispatch_with_inputs()
    }
}

pub(crate) fn register(registry: &mut PipelineRegistry) -> ScaffoldResult<()> {
    registry.register::<BuildPipeline>("BuildPipeline", module_path!())
}
