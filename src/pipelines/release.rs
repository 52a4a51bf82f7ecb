// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Release pipeline
//!
//! Tags a release once the build workflow has passed. Publishing the tag
//! (and whatever the host does with it) is left to `push-tag`.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::shell_quote;
use crate::builder::WorkflowConfig;
use crate::errors::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{Pipeline, PipelineContext, PipelineRegistry, PipelineResult};

const VERSION_PATTERN: &str = r"^\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$";

/// Creates an annotated git tag for a version
#[derive(Debug, Default)]
pub struct ReleasePipeline;

fn version_regex() -> Option<&'static Regex> {
    static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
    VERSION.get_or_init(|| Regex::new(VERSION_PATTERN).ok()).as_ref()
}

/// Whether `version` is a semantic version without a leading `v`
pub fn is_valid_version(version: &str) -> bool {
    version_regex().is_some_and(|re| re.is_match(version))
}

/// Accept tag names such as `v1.2.0` as versions
fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[async_trait]
impl Pipeline for ReleasePipeline {
    fn validate(&self, ctx: &PipelineContext) -> bool {
        match ctx.inputs.get("version") {
            Some(version) if is_valid_version(strip_v(version)) => true,
            Some(version) => {
                tracing::error!(version, "not a semantic version");
                false
            }
            None => {
                tracing::error!("input 'version' is required");
                false
            }
        }
    }

    async fn execute(&self, ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
        let version = ctx
            .inputs
            .get("version")
            .map(strip_v)
            .ok_or_else(|| ScaffoldError::ExecutionFailed {
                message: "input 'version' is required".into(),
                help: Some("Set INPUT_VERSION or pass it as a dispatch input".into()),
            })?;

        let tag = format!("{}{}", ctx.inputs.get_or("tag-prefix", "v"), version);
        let default_notes = format!("Release {}", tag);
        let notes = ctx.inputs.get_or("release-notes", &default_notes);

        tracing::info!(%tag, "creating release tag");
        ctx.run_command(&format!(
            "git tag -a {} -m {}",
            shell_quote(&tag),
            shell_quote(notes)
        ))
        .await?;

        if ctx.inputs.flag("push-tag") {
            tracing::info!(%tag, "pushing release tag");
            ctx.run_command(&format!("git push origin {}", shell_quote(&tag)))
                .await?;
        }

        Ok(PipelineResult::success(format!("Tagged {}", tag))
            .with_data("tag", tag.as_str())
            .with_data("version", version))
    }

    fn description() -> Option<String> {
        Some("Tag a release".into())
    }

    fn workflow_config() -> WorkflowConfig {
        WorkflowConfig::new()
            .add_input("version", "Version to release", true, None)
            .add_input("release-notes", "Release notes", false, Some("".into()))
            .add_input("tag-prefix", "Prefix of the git tag", false, Some("v".into()))
            .add_input("push-tag", "Push the tag to origin", false, Some("true".into()))
            .on_workflow_dispatch_with_inputs()
            .depends_on(["BuildPipeline"])
    }
}

pub(crate) fn register(registry: &mut PipelineRegistry) -> ScaffoldResult<()> {
    registry.register::<ReleasePipeline>("ReleasePipeline", module_path!())
}
