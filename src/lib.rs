// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! # pipescaffold - workflow scaffolding for typed pipelines
//!
//! Pipelines are Rust types implementing [`Pipeline`]. Each one declares
//! its inputs, toolchain setup, triggers and environment through a
//! [`builder::WorkflowConfig`], and is registered by name in a
//! [`PipelineRegistry`]. From that declaration `pipescaffold` writes a
//! GitHub Actions workflow whose job runs the very same pipeline through
//! `pipescaffold run`.
//!
//! ## Features
//!
//! - **Typed pipelines** - inputs, setup and triggers live next to the code
//! - **Discovery** - `build` finds `BuildPipeline`, scoped by module
//! - **Overrides** - per-workflow sidecar files and `--trigger` JSON
//! - **Composite workflows** - several pipelines as dependent jobs
//! - **Run control** - trigger, poll and collect logs of remote runs
//!
//! ## Quick Start
//!
//! ```bash
//! # See what is registered
//! pipescaffold list
//!
//! # Write .github/workflows/build.yml
//! pipescaffold generate --pipeline build
//!
//! # Regenerate after changing the pipeline
//! pipescaffold generate --pipeline build --update
//! ```

pub mod builder;
pub mod cli;
pub mod controller;
pub mod errors;
pub mod pipeline;
pub mod pipelines;
pub mod runner;
pub mod scaffold;
pub mod utils;

// Re-export commonly used types
pub use errors::{ScaffoldError, ScaffoldResult};
pub use pipeline::{Pipeline, PipelineContext, PipelineRegistry, PipelineResult};
pub use scaffold::{GenerateOptions, ScaffoldGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
