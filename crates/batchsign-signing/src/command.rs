//! External command execution
//!
//! Command lines are run through the host shell and their output captured.
//! Success is decided by exit status alone; retries are the caller's job.

use std::fmt;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// A shell command line, with values that must never reach the logs
#[derive(Clone, PartialEq, Eq)]
pub struct ShellCommand {
    line: String,
    secrets: Vec<String>,
}

impl ShellCommand {
    /// Create a command from a full command line
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            secrets: Vec::new(),
        }
    }

    /// Mark a value embedded in the line as secret
    pub fn secret(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.push(value);
        }
        self
    }

    /// The command line as executed
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The command line with secrets masked
    pub fn redacted(&self) -> String {
        self.secrets
            .iter()
            .fold(self.line.clone(), |line, secret| line.replace(secret, "***"))
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellCommand")
            .field("line", &self.redacted())
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Why a command did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandFailure {
    /// The process ran and exited unsuccessfully
    #[error("command exited with {}", describe_exit(*code))]
    Exited {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The process could not be started
    #[error("failed to launch command: {message}")]
    Launch { message: String },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl CommandFailure {
    /// Log every piece of diagnostic text the failure carries
    pub fn log(&self) {
        match self {
            Self::Exited { stdout, stderr, .. } => {
                warn!("{}", self);
                if !stdout.trim().is_empty() {
                    info!("{}", stdout.trim_end());
                }
                if !stderr.trim().is_empty() {
                    warn!("{}", stderr.trim_end());
                }
            }
            Self::Launch { .. } => warn!("{}", self),
        }
    }
}

/// Executes command lines
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command line to completion
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, CommandFailure>;
}

/// Runs commands through the host shell
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Create a new shell runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandRunner for ShellRunner {
    #[instrument(skip_all, fields(command = %command))]
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, CommandFailure> {
        let mut cmd = shell_command(command.line());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| CommandFailure::Launch {
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!(status = ?output.status.code(), "command finished");

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(CommandFailure::Exited {
                code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    // Passed verbatim so cmd sees the quoting exactly as built.
    let mut cmd = Command::new("cmd");
    cmd.raw_arg(format!("/d /s /c \"{}\"", line));
    cmd
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}
