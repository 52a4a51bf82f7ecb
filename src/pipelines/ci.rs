// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Composite CI pipeline
//!
//! In CI this becomes one workflow with a build job and a release job that
//! only runs for version tags. Run locally, it builds.

use async_trait::async_trait;

use super::build::BuildPipeline;
use crate::builder::WorkflowConfig;
use crate::errors::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{JobSpec, Pipeline, PipelineContext, PipelineRegistry, PipelineResult};

/// Build on every push, release on version tags
#[derive(Debug, Default)]
pub struct CiPipeline;

#[async_trait]
impl Pipeline for CiPipeline {
    async fn execute(&self, ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
        BuildPipeline.execute(ctx).await
    }

    fn description() -> Option<String> {
        Some("Build, then release tagged versions".into())
    }

    fn workflow_config() -> WorkflowConfig {
        WorkflowConfig::new()
            .on_push(["main"])
            .on_pull_request(["main"])
            .add_job("build", JobSpec::new("BuildPipeline"))
            .add_job(
                "release",
                JobSpec::new("ReleasePipeline")
                    .input("version", "${{ github.ref_name }}")
                    .input("push-tag", "false")
                    .needs(["build"])
                    .condition("startsWith(github.ref, 'refs/tags/')"),
            )
    }
}

pub(crate) fn register(registry: &mut PipelineRegistry) -> ScaffoldResult<()> {
    registry.register::<CiPipeline>("CiPipeline", module_path!())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{run_pipeline, JobGraph, PipelineInputs};
    use crate::pipelines::testing::RecordingRunner;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_job_graph() {
        let config = CiPipeline::workflow_config().build();
        let graph = JobGraph::build(&config.jobs).unwrap();
        assert!(graph.depends_on("release", "build"));
        assert_eq!(config.jobs["release"].inputs["push-tag"], "false");
    }

    #[tokio::test]
    async fn test_local_run_builds() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let ctx = PipelineContext::new(PipelineInputs::new(), dir.path()).with_runner(runner.clone());

        let result = run_pipeline(&CiPipeline, &ctx).await;
        assert!(result.success);
        assert_eq!(runner.commands(), vec!["cargo build --release"]);
    }
}
