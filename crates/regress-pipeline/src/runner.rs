//! External tool execution.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::env::RunEnvironment;
use crate::error::{StageError, StageResult};
use crate::stage::ToolCommand;

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub tool: String,

    /// Exit code, -1 when terminated by a signal.
    pub exit_code: i32,

    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ToolOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Launches pipeline tools.
pub struct ToolRunner;

impl ToolRunner {
    /// Run `command` with `work_dir` as its working directory.
    ///
    /// Exit status is reported, not judged: callers decide success from the
    /// files the tool leaves behind. A `timeout_secs` of zero waits forever;
    /// on timeout the child is killed.
    pub async fn execute(
        command: &ToolCommand,
        work_dir: &Path,
        env: &RunEnvironment,
        timeout_secs: u64,
    ) -> StageResult<ToolOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        env.apply(&mut cmd);

        let child = cmd.spawn().map_err(|source| StageError::Tool {
            tool: command.name.clone(),
            source,
        })?;

        let waited = if timeout_secs > 0 {
            tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
                .await
                .map_err(|_| StageError::ToolTimeout {
                    tool: command.name.clone(),
                    secs: timeout_secs,
                })?
        } else {
            child.wait_with_output().await
        };
        let output = waited.map_err(|source| StageError::Tool {
            tool: command.name.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(tool = %command.name, exit_code, duration_ms, "tool finished");

        Ok(ToolOutput {
            tool: command.name.clone(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
        })
    }
}
