// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Command runners
//!
//! Pipelines run external commands through the [`CommandRunner`] trait so
//! that the execution strategy can be swapped (and faked in tests).

mod shell;

pub use shell::ShellRunner;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::errors::ScaffoldError;
use crate::pipeline::EnvMap;

/// Captured result of one command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the command exited successfully
    pub success: bool,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Exit code (-1 when killed by a signal)
    pub exit_code: i32,

    /// Wall-clock duration
    pub duration: Duration,
}

impl CommandOutput {
    /// Turn a non-zero exit into an error
    pub fn into_result(self, command: &str) -> Result<Self, ScaffoldError> {
        if self.success {
            Ok(self)
        } else {
            Err(ScaffoldError::command_failed(
                command,
                self.exit_code,
                &self.stderr,
            ))
        }
    }
}

/// Trait for command runners
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command line in `working_dir` with extra environment variables
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        env: &EnvMap,
    ) -> Result<CommandOutput, ScaffoldError>;
}
