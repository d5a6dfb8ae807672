//! Process execution for the external tools.

use std::io;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::tool::{Tool, ToolError};

/// Runs docker, git or gh. [`ToolClient`](crate::ToolClient) never spawns a
/// process itself, so tests swap this for a mock.
#[allow(async_fn_in_trait)]
pub trait ToolExecutor: Send + Sync {
    /// Run and return stdout.
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ToolError>;

    /// Run with output attached to the terminal. Used for image builds,
    /// where progress matters more than the captured text.
    async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ToolError>;

    /// Run with `stdin_data` written to stdin, which is then closed.
    async fn exec_with_stdin(
        &self,
        tool: Tool,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, ToolError>;
}

/// Spawns real processes with `tokio::process`.
pub struct RealExecutor;

impl RealExecutor {
    fn command(tool: Tool, args: &[String]) -> Command {
        tracing::debug!(%tool, ?args, "running");
        let mut cmd = Command::new(tool.program());
        cmd.args(args).kill_on_drop(true);
        cmd
    }
}

impl ToolExecutor for RealExecutor {
    async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ToolError> {
        let output = Self::command(tool, args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| launch_error(tool, e))?;

        captured(tool, args, output)
    }

    async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ToolError> {
        let status = Self::command(tool, args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| launch_error(tool, e))?;

        if status.success() {
            return Ok(());
        }
        Err(ToolError::CommandFailed {
            tool,
            args: args.to_vec(),
            stderr: format!("{status} (output above)"),
        })
    }

    async fn exec_with_stdin(
        &self,
        tool: Tool,
        args: &[String],
        stdin_data: &[u8],
    ) -> Result<String, ToolError> {
        let mut child = Self::command(tool, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| launch_error(tool, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            let stdin_error = |source: io::Error| ToolError::StdinWrite { tool, source };
            stdin.write_all(stdin_data).await.map_err(stdin_error)?;
            stdin.shutdown().await.map_err(stdin_error)?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ToolError::Io { tool, source })?;

        captured(tool, args, output)
    }
}

/// A missing binary gets an install hint; anything else is an I/O failure.
fn launch_error(tool: Tool, source: io::Error) -> ToolError {
    match source.kind() {
        io::ErrorKind::NotFound => ToolError::NotFound { tool, source },
        _ => ToolError::Io { tool, source },
    }
}

fn captured(tool: Tool, args: &[String], output: Output) -> Result<String, ToolError> {
    if !output.status.success() {
        return Err(ToolError::CommandFailed {
            tool,
            args: args.to_vec(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
        });
    }
    String::from_utf8(output.stdout).map_err(|source| ToolError::InvalidUtf8 { tool, source })
}
