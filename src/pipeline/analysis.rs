// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Descriptor extraction
//!
//! Turns a registered pipeline into a [`PipelineDescriptor`] by querying its
//! static accessors. Values equal to the defaults contribute nothing.

use super::descriptor::{
    DescriptorConfig, PipelineDescriptor, DEFAULT_RUNS_ON, DEFAULT_RUNTIME_VERSION,
};
use super::registry::PipelineEntry;

/// Path segment that marks where built-in and user pipelines live
const PIPELINES_SEGMENT: &str = "::pipelines::";

/// Build the descriptor of a registered pipeline
pub fn analyze(entry: &PipelineEntry, module_prefix: Option<&str>) -> PipelineDescriptor {
    let accessors = entry.accessors();
    let name = entry.name().to_string();

    let config = DescriptorConfig {
        inputs: accessors.inputs,
        setup: accessors.setup,
        triggers: accessors.triggers,
        env: accessors.env,
        runs_on: (accessors.runs_on != DEFAULT_RUNS_ON).then_some(accessors.runs_on),
        runtime_version: (accessors.runtime_version != DEFAULT_RUNTIME_VERSION)
            .then_some(accessors.runtime_version),
        dependencies: accessors.dependencies,
        jobs: accessors.jobs,
    };

    PipelineDescriptor {
        description: accessors
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{} pipeline", name)),
        module: resolve_module_reference(&name, Some(entry.module()), module_prefix),
        name,
        config,
    }
}

/// Module reference embedded in the generated run command
///
/// Registry provenance wins when it survives prefix stripping; otherwise
/// the reference is guessed from the name.
pub fn resolve_module_reference(
    name: &str,
    provenance: Option<&str>,
    module_prefix: Option<&str>,
) -> String {
    provenance
        .and_then(|module| strip_module_prefix(module, module_prefix))
        .unwrap_or_else(|| heuristic_module(name))
}

/// Remove the configured prefix, or everything up to `::pipelines::`
///
/// Returns `None` when nothing is left to refer to.
fn strip_module_prefix(module: &str, module_prefix: Option<&str>) -> Option<String> {
    let stripped = match module_prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => module
            .strip_prefix(prefix)
            .map(|rest| rest.trim_start_matches("::"))?,
        None => match module.find(PIPELINES_SEGMENT) {
            Some(at) => &module[at + PIPELINES_SEGMENT.len()..],
            None => module,
        },
    };

    let stripped = stripped.trim();
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Guess a module from the pipeline name
///
/// `FlutterBuildPipeline` becomes `build::flutter` and `ReleasePipeline`
/// becomes `test`. A convention only, never verified.
fn heuristic_module(name: &str) -> String {
    let squashed = name.to_lowercase().replace("pipeline", "").replace('_', "");

    let (group, rest) = if squashed.contains("build") {
        ("build", squashed.replace("build", ""))
    } else if squashed.contains("release") {
        ("test", squashed.replace("release", ""))
    } else if squashed.contains("version") {
        ("test", squashed.replace("version", ""))
    } else {
        ("base", squashed)
    };

    if rest.is_empty() {
        group.to_string()
    } else {
        format!("{}::{}", group, rest)
    }
}
