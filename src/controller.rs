// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipescaffold contributors

//! Workflow run control
//!
//! [`WorkflowRunController`] is the seam to whatever talks to the CI host
//! (an API client, the `gh` CLI). This module only defines it and the
//! polling loop built on top of it.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ScaffoldResult;

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Queued,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

/// How a completed run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    Neutral,
    #[serde(other)]
    Unknown,
}

/// Snapshot of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: RunState,

    #[serde(default)]
    pub conclusion: Option<RunConclusion>,

    #[serde(default)]
    pub url: Option<String>,
}

impl RunStatus {
    pub fn new(status: RunState, conclusion: Option<RunConclusion>) -> Self {
        Self {
            status,
            conclusion,
            url: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status == RunState::Completed
    }

    pub fn is_success(&self) -> bool {
        self.is_terminal() && self.conclusion == Some(RunConclusion::Success)
    }
}

/// Request to start a workflow run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRequest {
    /// Workflow file name, e.g. `release.yml`
    pub workflow: String,

    /// Branch or tag; the default branch when unset
    pub git_ref: Option<String>,

    /// Dispatch inputs
    pub inputs: IndexMap<String, String>,
}

/// Starts, observes and collects logs of workflow runs
#[async_trait]
pub trait WorkflowRunController: Send + Sync {
    /// Start a run and return its id
    async fn trigger(&self, request: &TriggerRequest) -> ScaffoldResult<u64>;

    /// Current status of a run
    async fn status(&self, run_id: u64) -> ScaffoldResult<RunStatus>;

    /// Save the logs of a run and return where they went
    async fn collect_logs(&self, run_id: u64) -> ScaffoldResult<PathBuf>;
}

/// Polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(60 * 60),
        }
    }
}

/// How waiting for a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded(RunStatus),
    Failed {
        status: RunStatus,
        logs: Option<PathBuf>,
    },
    TimedOut {
        last: Option<RunStatus>,
        logs: Option<PathBuf>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Poll a run until it completes or `options.timeout` elapses
///
/// Status lookups that fail are logged and retried on the next tick. Logs
/// are collected for failed and timed out runs; a failure to collect them
/// is only logged.
pub async fn wait_for_completion(
    controller: &dyn WorkflowRunController,
    run_id: u64,
    options: PollOptions,
) -> RunOutcome {
    let deadline = Instant::now() + options.timeout;
    let mut last = None;
    let mut iteration = 0u32;

    loop {
        iteration += 1;

        match controller.status(run_id).await {
            Ok(status) if status.is_success() => {
                tracing::info!(run_id, iteration, "workflow run succeeded");
                return RunOutcome::Succeeded(status);
            }
            Ok(status) if status.is_terminal() => {
                tracing::error!(run_id, iteration, conclusion = ?status.conclusion, "workflow run failed");
                let logs = collect_logs(controller, run_id).await;
                return RunOutcome::Failed { status, logs };
            }
            Ok(status) => {
                tracing::info!(run_id, iteration, state = ?status.status, "waiting for workflow run");
                last = Some(status);
            }
            Err(e) => {
                tracing::warn!(run_id, iteration, "cannot read run status: {}", e);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::error!(run_id, timeout = ?options.timeout, "timed out waiting for workflow run");
            let logs = collect_logs(controller, run_id).await;
            return RunOutcome::TimedOut { last, logs };
        }
        tokio::time::sleep(options.interval.min(deadline - now)).await;
    }
}

/// Trigger a run and wait for it
pub async fn run_workflow(
    controller: &dyn WorkflowRunController,
    request: &TriggerRequest,
    options: PollOptions,
) -> ScaffoldResult<RunOutcome> {
    let run_id = controller.trigger(request).await?;
    tracing::info!(workflow = %request.workflow, run_id, "triggered workflow run");
    Ok(wait_for_completion(controller, run_id, options).await)
}

async fn collect_logs(controller: &dyn WorkflowRunController, run_id: u64) -> Option<PathBuf> {
    match controller.collect_logs(run_id).await {
        Ok(path) => {
            tracing::info!(run_id, path = %path.display(), "saved run logs");
            Some(path)
        }
        Err(e) => {
            tracing::warn!(run_id, "cannot collect run logs: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ScaffoldError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted statuses; repeats the last one when exhausted
    struct Scripted {
        statuses: Mutex<VecDeque<ScaffoldResult<RunStatus>>>,
        polls: Mutex<u32>,
        logs_collected: Mutex<bool>,
        logs_fail: bool,
    }

    impl Scripted {
        fn new(statuses: Vec<ScaffoldResult<RunStatus>>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                polls: Mutex::new(0),
                logs_collected: Mutex::new(false),
                logs_fail: false,
            }
        }
    }

    #[async_trait]
    impl WorkflowRunController for Scripted {
        async fn trigger(&self, _request: &TriggerRequest) -> ScaffoldResult<u64> {
            Ok(42)
        }

        async fn status(&self, _run_id: u64) -> ScaffoldResult<RunStatus> {
            *self.polls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            match statuses.len() {
                0 => Ok(RunStatus::new(RunState::InProgress, None)),
                1 => match statuses.front() {
                    Some(Ok(status)) => Ok(status.clone()),
                    _ => Err(ScaffoldError::Io { message: "gone".into() }),
                },
                _ => statuses.pop_front().unwrap_or_else(|| {
                    Err(ScaffoldError::Io { message: "empty".into() })
                }),
            }
        }

        async fn collect_logs(&self, run_id: u64) -> ScaffoldResult<PathBuf> {
            *self.logs_collected.lock().unwrap() = true;
            if self.logs_fail {
                Err(ScaffoldError::Io { message: "no logs".into() })
            } else {
                Ok(PathBuf::from(format!("run-{}.log", run_id)))
            }
        }
    }

    fn fast() -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn test_success_after_progress() {
        let controller = Scripted::new(vec![
            Ok(RunStatus::new(RunState::Queued, None)),
            Ok(RunStatus::new(RunState::InProgress, None)),
            Ok(RunStatus::new(RunState::Completed, Some(RunConclusion::Success))),
        ]);

        let outcome = wait_for_completion(&controller, 42, fast()).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(*controller.polls.lock().unwrap(), 3);
        assert!(!*controller.logs_collected.lock().unwrap());
    }

    #[tokio::test]
    async fn test_failure_collects_logs() {
        let controller = Scripted::new(vec![Ok(RunStatus::new(
            RunState::Completed,
            Some(RunConclusion::Failure),
        ))]);

        let outcome = wait_for_completion(&controller, 7, fast()).await;
        match outcome {
            RunOutcome::Failed { logs, .. } => assert_eq!(logs, Some(PathBuf::from("run-7.log"))),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let controller = Scripted {
            logs_fail: true,
            ..Scripted::new(Vec::new())
        };
        let options = PollOptions {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(30),
        };

        let outcome = wait_for_completion(&controller, 1, options).await;
        assert_eq!(outcome.exit_code(), 1);
        match outcome {
            RunOutcome::TimedOut { last, logs } => {
                assert_eq!(last.map(|s| s.status), Some(RunState::InProgress));
                assert!(logs.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(*controller.logs_collected.lock().unwrap());
    }

    #[tokio::test]
    async fn test_status_errors_are_retried() {
        let controller = Scripted::new(vec![
            Err(ScaffoldError::Io { message: "rate limited".into() }),
            Ok(RunStatus::new(RunState::Completed, Some(RunConclusion::Success))),
        ]);

        let outcome = wait_for_completion(&controller, 1, fast()).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_run_workflow_triggers_then_waits() {
        let controller = Scripted::new(vec![Ok(RunStatus::new(
            RunState::Completed,
            Some(RunConclusion::Success),
        ))]);
        let request = TriggerRequest {
            workflow: "release.yml".into(),
            ..TriggerRequest::default()
        };

        let outcome = run_workflow(&controller, &request, fast()).await.unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_status_parses_host_json() {
        let status: RunStatus = serde_json::from_str(
            r#"{"status": "completed", "conclusion": "timed_out", "url": "https://example.test/run/1"}"#,
        )
        .unwrap();
        assert!(status.is_terminal());
        assert!(!status.is_success());
        assert_eq!(status.conclusion, Some(RunConclusion::Unknown));
    }
}
