// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! List command - show registered pipelines

use colored::Colorize;
use miette::Result;

use crate::pipeline::PipelineRegistry;
use crate::scaffold::ProjectConfig;
use crate::utils::print_header;

/// Run the list command
pub async fn run(registry: &PipelineRegistry, verbose: bool) -> Result<()> {
    if registry.is_empty() {
        println!("{}", "No pipelines registered.".yellow());
        return Ok(());
    }

    let root = super::project_root()?;
    let scope = ProjectConfig::load_from_project(&root).search_scope();

    print_header("Pipelines");
    for entry in registry.visible(&scope) {
        let accessors = entry.accessors();
        let description = accessors.description.unwrap_or_default();
        println!("  {} {}", entry.name().bold(), description.as_str().dimmed());
        if verbose {
            println!("      {} {}", "module:".dimmed(), entry.module());
            if !accessors.dependencies.is_empty() {
                println!(
                    "      {} {}",
                    "after:".dimmed(),
                    accessors.dependencies.join(", ")
                );
            }
        }
    }
    Ok(())
}
