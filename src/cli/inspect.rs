// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Inspect command - print what a pipeline declares

use miette::Result;

use super::InspectFormat;
use crate::pipeline::PipelineRegistry;
use crate::scaffold::ScaffoldGenerator;

/// Run the inspect command
pub async fn run(
    registry: &PipelineRegistry,
    pipeline: &str,
    format: InspectFormat,
    _verbose: bool,
) -> Result<()> {
    let root = super::project_root()?;
    let descriptor = ScaffoldGenerator::new(registry, &root).describe(pipeline)?;

    let output = match format {
        InspectFormat::Yaml => descriptor.to_yaml()?,
        InspectFormat::Json => descriptor.to_json()?,
    };
    println!("{}", output.trim_end());
    Ok(())
}
