// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Pipelines and their CI descriptors
//!
//! This module defines the pipeline contract, the registry pipelines are
//! discovered through, and the descriptor a registered pipeline is analyzed
//! into before a workflow is generated from it.

mod analysis;
mod contract;
mod dag;
mod descriptor;
mod inputs;
mod registry;

pub use analysis::{analyze, resolve_module_reference};
pub use contract::{run_pipeline, Pipeline, PipelineContext, PipelineResult};
pub use dag::JobGraph;
pub use descriptor::*;
pub use inputs::{canonical_key, input_env_var, is_canonical_key, PipelineInputs, INPUT_ENV_PREFIX};
pub use registry::{PipelineAccessors, PipelineEntry, PipelineMetadata, PipelineRegistry, SearchScope};
