// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Version bump pipeline
//!
//! Increments the version in a `Cargo.toml` (the `[package]` version line)
//! or a JSON manifest (the top-level `"version"` field), rewriting only the
//! version itself so the rest of the file stays byte-for-byte the same.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use super::shell_quote;
use crate::builder::WorkflowConfig;
use crate::errors::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{Pipeline, PipelineContext, PipelineRegistry, PipelineResult};

const TOML_VERSION: &str = r#"(?m)^(version\s*=\s*")(\d+\.\d+\.\d+)(")"#;
const JSON_VERSION: &str = r#"("version"\s*:\s*")(\d+\.\d+\.\d+)(")"#;

/// Which part of the version to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl FromStr for BumpKind {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(ScaffoldError::ExecutionFailed {
                message: format!("invalid version type '{}'", other),
                help: Some("Use one of: major, minor, patch".into()),
            }),
        }
    }
}

/// Increment a `MAJOR.MINOR.PATCH` version
pub fn bump_version(version: &str, kind: BumpKind) -> ScaffoldResult<String> {
    let invalid = || ScaffoldError::ExecutionFailed {
        message: format!("invalid version '{}'", version),
        help: Some("Expected MAJOR.MINOR.PATCH".into()),
    };

    let parts = version
        .trim()
        .split('.')
        .map(|p| p.parse::<u64>().map_err(|_| invalid()))
        .collect::<ScaffoldResult<Vec<_>>>()?;
    let [major, minor, patch] = parts[..] else {
        return Err(invalid());
    };

    let (major, minor, patch) = match kind {
        BumpKind::Major => (major + 1, 0, 0),
        BumpKind::Minor => (major, minor + 1, 0),
        BumpKind::Patch => (major, minor, patch + 1),
    };
    Ok(format!("{}.{}.{}", major, minor, patch))
}

/// Version pattern of a JSON or TOML manifest, compiled once
fn manifest_regex(is_json: bool) -> ScaffoldResult<&'static Regex> {
    static TOML: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    static JSON: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

    let (cell, pattern) = if is_json {
        (&JSON, JSON_VERSION)
    } else {
        (&TOML, TOML_VERSION)
    };
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| ScaffoldError::ExecutionFailed {
            message: e.to_string(),
            help: None,
        })
}

/// Rewrite the first version in a manifest
///
/// Returns the old version, the new version and the new content.
fn bump_manifest(
    path: &Path,
    content: &str,
    kind: BumpKind,
) -> ScaffoldResult<(String, String, String)> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let re = manifest_regex(is_json)?;

    let captures = re
        .captures(content)
        .ok_or_else(|| ScaffoldError::ExecutionFailed {
            message: format!("no version found in {}", path.display()),
            help: None,
        })?;
    let old = captures[2].to_string();
    let new = bump_version(&old, kind)?;

    let updated = re
        .replace(content, |caps: &regex::Captures<'_>| {
            format!("{}{}{}", &caps[1], new, &caps[3])
        })
        .into_owned();
    Ok((old, new, updated))
}

/// Bumps the project version and optionally commits the change
#[derive(Debug, Default)]
pub struct VersionBumpPipeline;

#[async_trait]
impl Pipeline for VersionBumpPipeline {
    fn validate(&self, ctx: &PipelineContext) -> bool {
        match ctx.inputs.get_or("version-type", "patch").parse::<BumpKind>() {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    async fn execute(&self, ctx: &PipelineContext) -> Result<PipelineResult, ScaffoldError> {
        let version_file = ctx.inputs.get_or("version-file", "Cargo.toml");
        let kind: BumpKind = ctx.inputs.get_or("version-type", "patch").parse()?;
        let path = ctx.root().join(version_file);

        let content = std::fs::read_to_string(&path).map_err(|e| ScaffoldError::FileReadError {
            path: path.clone(),
            error: e.to_string(),
        })?;
        let (old, new, updated) = bump_manifest(&path, &content, kind)?;
        std::fs::write(&path, updated).map_err(|e| ScaffoldError::FileWriteError {
            path: path.clone(),
            error: e.to_string(),
        })?;
        tracing::info!(file = %version_file, %old, %new, "bumped version");

        if ctx.inputs.flag("commit-changes") {
            ctx.run_command(&format!("git add {}", shell_quote(version_file)))
                .await?;
            ctx.run_command(&format!(
                "git commit -m {}",
                shell_quote(&format!("chore: bump version to {}", new))
            ))
            .await?;
        }

        Ok(PipelineResult::success(format!("Version bumped: {} -> {}", old, new))
            .with_data("old-version", old.as_str())
            .with_data("new-version", new.as_str())
            .with_data("version-file", version_file))
    }

    fn description() -> Option<String> {
        Some("Increment the project version".into())
    }

    fn workflow_config() -> WorkflowConfig {
        WorkflowConfig::new()
            .add_input("version-file", "Manifest holding the version", false, Some("Cargo.toml".into()))
            .add_input("version-type", "Part to bump (major|minor|patch)", false, Some("patch".into()))
            .add_input("commit-changes", "Commit the bumped manifest", false, Some("true".into()))
            .on_workflow_dispatch_with_inputs()
    }
}

pub(crate) fn register(registry: &mut PipelineRegistry) -> ScaffoldResult<()> {
    registry.register::<VersionBumpPipeline>("VersionBumpPipeline", module_path!())
}
