// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Shell runner
//!
//! Hands a command line to a shell (`bash -c` by default).

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;

use super::{CommandOutput, CommandRunner};
use crate::errors::ScaffoldError;
use crate::pipeline::EnvMap;

/// Runs commands through a shell
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    /// Create a runner using `bash`
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    /// Create a runner using another shell
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        env: &EnvMap,
    ) -> Result<CommandOutput, ScaffoldError> {
        if command.trim().is_empty() {
            return Err(ScaffoldError::ExecutionFailed {
                message: "Command is empty".to_string(),
                help: None,
            });
        }

        tracing::debug!(command, dir = %working_dir.display(), "running command");
        let start = Instant::now();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd.current_dir(working_dir);
        cmd.envs(env);

        let output = cmd.output().await.map_err(|e| ScaffoldError::ExecutionFailed {
            message: e.to_string(),
            help: Some(format!("Shell '{}' may not be available", self.shell)),
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_simple_command() {
        let runner = ShellRunner::new();
        let output = runner
            .run("echo hello", Path::new("."), &EnvMap::new())
            .await
            .unwrap();

        assert!(output.success);
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_env_is_passed() {
        let runner = ShellRunner::new();
        let mut env = EnvMap::new();
        env.insert("INPUT_VERSION".into(), "1.2.3".into());

        let output = runner
            .run("echo $INPUT_VERSION", Path::new("."), &env)
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "1.2.3");
    }

    #[tokio::test]
    async fn test_failing_command_reports_exit_code() {
        let runner = ShellRunner::new();
        let output = runner
            .run("exit 3", Path::new("."), &EnvMap::new())
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let runner = ShellRunner::new();
        assert!(runner.run("  ", Path::new("."), &EnvMap::new()).await.is_err());
    }
}
