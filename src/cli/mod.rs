// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for pipescaffold. The binary builds a
//! [`PipelineRegistry`] and hands it to [`dispatch`] together with the parsed
//! arguments, so embedding crates can ship their own binary with extra
//! pipelines registered.

pub mod generate;
pub mod inspect;
pub mod list;
pub mod run;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineRegistry;
use crate::scaffold::detect_project_root;

/// Workflow scaffolding for typed pipelines
#[derive(Parser, Debug)]
#[clap(
    name = "pipescaffold",
    version,
    about = "Generate GitHub Actions workflows from typed pipeline definitions",
    long_about = None,
    after_help = "Examples:\n\
        pipescaffold list                                List registered pipelines\n\
        pipescaffold generate --pipeline build           Write .github/workflows/build.yml\n\
        pipescaffold inspect --pipeline release          Show what a pipeline declares\n\
        pipescaffold run pipelines::BuildPipeline        Execute a pipeline (as CI does)\n\n\
        See 'pipescaffold <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a workflow file for a pipeline
    Generate {
        /// Pipeline name (exact, or e.g. "build" for BuildPipeline)
        #[clap(short, long)]
        pipeline: String,

        /// Output file (default: <workflows dir>/<pipeline>.yml)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Override file (default: sidecar next to the workflows)
        #[clap(short, long)]
        config: Option<PathBuf>,

        /// Overwrite an existing workflow file
        #[clap(short, long)]
        update: bool,

        /// Replace the triggers with a JSON object
        #[clap(short, long, value_name = "JSON")]
        trigger: Option<String>,

        /// Print the workflow instead of writing it
        #[clap(long)]
        stdout: bool,
    },

    /// List registered pipelines
    List,

    /// Show the descriptor of a pipeline
    Inspect {
        /// Pipeline name
        #[clap(short, long)]
        pipeline: String,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = InspectFormat::Yaml)]
        format: InspectFormat,
    },

    /// Execute a pipeline, reading its inputs from INPUT_* variables
    Run {
        /// Pipeline reference as written in workflows (<module>::<name>)
        target: String,
    },
}

/// Output format for the inspect command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InspectFormat {
    Yaml,
    Json,
}

/// Run a parsed command line against a registry
pub async fn dispatch(cli: Cli, registry: &PipelineRegistry) -> Result<()> {
    let verbose = cli.verbose;
    match cli.command {
        Commands::Generate {
            pipeline,
            output,
            config,
            update,
            trigger,
            stdout,
        } => {
            let options = crate::scaffold::GenerateOptions {
                pipeline,
                output: output.map(|p| absolute(&p)).transpose()?,
                config: config.map(|p| absolute(&p)).transpose()?,
                update,
                trigger,
            };
            generate::run(registry, options, stdout, verbose).await
        }
        Commands::List => list::run(registry, verbose).await,
        Commands::Inspect { pipeline, format } => {
            inspect::run(registry, &pipeline, format, verbose).await
        }
        Commands::Run { target } => run::run(registry, &target, verbose).await,
    }
}

/// Root of the project containing the working directory
pub(crate) fn project_root() -> Result<PathBuf> {
    let cwd = current_dir()?;
    Ok(detect_project_root(&cwd))
}

/// Paths given on the command line are relative to where the user is
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(current_dir()?.join(path))
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "pipescaffold",
            "-C",
            "demo",
            "generate",
            "--pipeline",
            "build",
            "--update",
            "--trigger",
            r#"{"push":{"branches":["main"]}}"#,
        ]);
        assert_eq!(cli.directory, Some(PathBuf::from("demo")));
        match cli.command {
            Commands::Generate {
                pipeline,
                update,
                trigger,
                stdout,
                ..
            } => {
                assert_eq!(pipeline, "build");
                assert!(update);
                assert!(!stdout);
                assert!(trigger.is_some());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_inspect_format() {
        let cli = Cli::parse_from(["pipescaffold", "inspect", "-p", "build", "-f", "json"]);
        assert!(matches!(
            cli.command,
            Commands::Inspect {
                format: InspectFormat::Json,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["pipescaffold", "inspect", "-p", "x", "-f", "toml"]).is_err());
    }
}
