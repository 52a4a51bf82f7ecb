// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Built-in pipelines
//!
//! Ready-made pipelines for Rust projects. Binaries embedding this crate
//! call [`register_builtin`] and then register their own pipelines on the
//! same registry.

pub mod build;
pub mod ci;
pub mod release;
pub mod version;

pub use build::BuildPipeline;
pub use ci::CiPipeline;
pub use release::ReleasePipeline;
pub use version::{bump_version, BumpKind, VersionBumpPipeline};

use crate::errors::ScaffoldResult;
use crate::pipeline::PipelineRegistry;

/// Register every built-in pipeline
pub fn register_builtin(registry: &mut PipelineRegistry) -> ScaffoldResult<()> {
    build::register(registry)?;
    release::register(registry)?;
    version::register(registry)?;
    ci::register(registry)?;
    Ok(())
}

/// Quote a value for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::errors::ScaffoldError;
    use crate::pipeline::EnvMap;
    use crate::runner::{CommandOutput, CommandRunner};

    /// Records commands and fails the ones containing a marker
    #[derive(Default)]
    pub struct RecordingRunner {
        pub commands: Mutex<Vec<String>>,
        pub fail_on: Option<String>,
    }

    impl RecordingRunner {
        pub fn failing_on(marker: &str) -> Self {
            Self {
                fail_on: Some(marker.to_string()),
                ..Self::default()
            }
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(
            &self,
            command: &str,
            _working_dir: &Path,
            _env: &EnvMap,
        ) -> Result<CommandOutput, ScaffoldError> {
            self.commands.lock().unwrap().push(command.to_string());
            let failed = self
                .fail_on
                .as_deref()
                .is_some_and(|marker| command.contains(marker));

            Ok(CommandOutput {
                success: !failed,
                stdout: String::new(),
                stderr: if failed { "boom".into() } else { String::new() },
                exit_code: if failed { 2 } else { 0 },
                duration: Duration::from_millis(1),
            })
        }
    }
}
