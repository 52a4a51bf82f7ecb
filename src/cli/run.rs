// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Run command - execute a pipeline the way a generated workflow does
//!
//! Inputs come from `INPUT_*` variables. Result data is appended to the file
//! named by `GITHUB_OUTPUT` so later steps can read it as step outputs.

use colored::Colorize;
use miette::Result;
use std::io::Write;
use std::path::Path;

use crate::errors::ScaffoldError;
use crate::pipeline::{
    resolve_module_reference, run_pipeline, PipelineContext, PipelineInputs, PipelineRegistry,
    PipelineResult, SearchScope,
};
use crate::scaffold::ProjectConfig;
use crate::utils::{print_error, print_success};

const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";
const OUTPUT_DELIMITER: &str = "PIPESCAFFOLD_EOF";

/// Run the run command
pub async fn run(registry: &PipelineRegistry, target: &str, verbose: bool) -> Result<()> {
    let (module, name) = split_target(target);
    let entry = registry.resolve(name, &SearchScope::all())?;

    let root = super::project_root()?;
    let config = ProjectConfig::load_from_project(&root);
    if let Some(module) = module {
        let expected = resolve_module_reference(
            entry.name(),
            Some(entry.module()),
            config.scaffold.module_prefix.as_deref(),
        );
        if module != expected {
            tracing::warn!(
                requested = module,
                registered = %expected,
                "module reference does not match the registered pipeline"
            );
        }
    }

    let inputs = PipelineInputs::from_env();
    if verbose {
        eprintln!(
            "{} {} ({} inputs)",
            "Running".bold(),
            entry.name(),
            inputs.len()
        );
    }

    let ctx = PipelineContext::new(inputs, &root);
    let pipeline = entry.instantiate();
    let result = run_pipeline(pipeline.as_ref(), &ctx).await;

    if let Some(path) = std::env::var_os(OUTPUT_FILE_VAR) {
        write_outputs(Path::new(&path), &result)?;
    }

    if result.success {
        print_success(&result.message);
        Ok(())
    } else {
        print_error(&result.message);
        Err(miette::miette!(
            "Pipeline '{}' failed with exit code {}",
            entry.name(),
            result.exit_code
        ))
    }
}

/// `release::ReleasePipeline` → (`Some("release")`, `ReleasePipeline`)
fn split_target(target: &str) -> (Option<&str>, &str) {
    match target.rsplit_once("::") {
        Some((module, name)) => (Some(module), name),
        None => (None, target),
    }
}

/// Render result data in the step output file format
fn format_outputs(result: &PipelineResult) -> String {
    let mut out = String::new();
    for (key, value) in &result.data {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if text.contains('\n') {
            out.push_str(&format!(
                "{key}<<{OUTPUT_DELIMITER}\n{text}\n{OUTPUT_DELIMITER}\n"
            ));
        } else {
            out.push_str(&format!("{key}={text}\n"));
        }
    }
    out
}

fn write_outputs(path: &Path, result: &PipelineResult) -> Result<(), ScaffoldError> {
    if result.data.is_empty() {
        return Ok(());
    }

    let write_error = |e: std::io::Error| ScaffoldError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_error)?;
    file.write_all(format_outputs(result).as_bytes())
        .map_err(write_error)
}
