// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Error types
//!
//! Every failure carries a diagnostic code and, where one exists, a hint
//! telling the user how to get unstuck.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipescaffold operations
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// Main error type for pipescaffold
#[derive(Error, Debug, Diagnostic)]
pub enum ScaffoldError {
    // ─────────────────────────────────────────────────────────────────────────
    // Discovery / Registration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline '{name}' not found")]
    #[diagnostic(
        code(pipescaffold::discovery),
        help("Registered pipelines: {available}")
    )]
    Discovery { name: String, available: String },

    #[error("Pipeline name '{name}' is ambiguous")]
    #[diagnostic(
        code(pipescaffold::ambiguous_pipeline),
        help("Use one of the exact names: {candidates}")
    )]
    AmbiguousPipeline { name: String, candidates: String },

    #[error("Cannot register pipeline '{name}': {reason}")]
    #[diagnostic(code(pipescaffold::registration))]
    Registration { name: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Generation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Workflow file already exists: {path}")]
    #[diagnostic(
        code(pipescaffold::exists),
        help("Pass --update to regenerate the existing workflow")
    )]
    Exists { path: PathBuf },

    #[error("Invalid configuration in '{path}': {message}")]
    #[diagnostic(code(pipescaffold::config))]
    Config { path: PathBuf, message: String },

    #[error("Cannot render workflow: {message}")]
    #[diagnostic(code(pipescaffold::serialization))]
    Serialization { message: String },

    #[error("Invalid --trigger value: {message}")]
    #[diagnostic(
        code(pipescaffold::invalid_trigger),
        help("Expected a JSON object such as '{{\"push\": {{\"branches\": [\"main\"]}}}}'")
    )]
    InvalidTrigger { message: String },

    #[error("Invalid job graph: {reason}")]
    #[diagnostic(
        code(pipescaffold::invalid_job_graph),
        help("Every 'needs' entry must name another job and jobs must not depend on each other in a cycle")
    )]
    InvalidJobGraph { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Execution failed: {message}")]
    #[diagnostic(code(pipescaffold::execution_failed))]
    ExecutionFailed {
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(pipescaffold::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(pipescaffold::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(pipescaffold::io_error))]
    Io { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(pipescaffold::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(pipescaffold::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for ScaffoldError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for ScaffoldError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for ScaffoldError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl ScaffoldError {
    /// Create a discovery error listing what could have been meant
    pub fn not_found<'a>(name: &str, available: impl IntoIterator<Item = &'a str>) -> Self {
        let available: Vec<&str> = available.into_iter().collect();
        Self::Discovery {
            name: name.to_string(),
            available: if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            },
        }
    }

    /// Create a registration error
    pub fn registration(name: &str, reason: impl Into<String>) -> Self {
        Self::Registration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an execution error for a command that exited unsuccessfully
    pub fn command_failed(command: &str, exit_code: i32, stderr: &str) -> Self {
        let help = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| format!("Last output line: {}", l.trim()));

        Self::ExecutionFailed {
            message: format!("'{}' exited with code {}", command, exit_code),
            help,
        }
    }

    /// Whether generation may continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
