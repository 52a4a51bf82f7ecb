// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Generate command - write a workflow file for a pipeline

use colored::Colorize;
use miette::Result;

use crate::pipeline::PipelineRegistry;
use crate::scaffold::{GenerateOptions, ScaffoldGenerator};
use crate::utils::print_success;

/// Run the generate command
pub async fn run(
    registry: &PipelineRegistry,
    options: GenerateOptions,
    stdout: bool,
    verbose: bool,
) -> Result<()> {
    let root = super::project_root()?;
    let generator = ScaffoldGenerator::new(registry, &root);

    if verbose {
        eprintln!("{} {}", "Project root:".dimmed(), root.display());
    }

    if stdout {
        let yaml = generator.render(&options)?.to_yaml()?;
        print!("{}", yaml);
        return Ok(());
    }

    let path = generator.generate(&options)?;
    let shown = path.strip_prefix(&root).unwrap_or(&path);
    print_success(&format!(
        "Workflow for {} written to {}",
        options.pipeline.as_str().bold(),
        shown.display()
    ));
    Ok(())
}
