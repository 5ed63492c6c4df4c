//! Seam between provisioning steps and the host's administration commands.

mod recording;

use std::{io, process::Stdio};

use async_trait::async_trait;
use hostcraft_config::LogType;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub use recording::RecordingRunner;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with status {status}: {stderr}")]
    Failed {
        command: String,
        status: i32,
        stderr: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

#[async_trait]
pub trait SystemRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError>;

    /// True when commands are only reported, in which case callers also skip
    /// their own filesystem changes.
    fn is_dry_run(&self) -> bool {
        false
    }

    /// Runs a command whose failure aborts the current step.
    async fn check(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        let output = self.run(program, args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(SystemError::Failed {
                command: command_line(program, args),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Runs a command whose non-zero exit is expected in some states, e.g.
    /// stopping a unit that is not loaded.
    async fn tolerate(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        let output = self.run(program, args).await?;
        if !output.success() {
            debug!(
                log_type = LogType::Provision.as_str(),
                "Ignoring exit status {} of `{}`",
                output.status,
                command_line(program, args)
            );
        }
        Ok(output)
    }
}

/// Runs commands on the host.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

#[async_trait]
impl SystemRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        debug!(
            log_type = LogType::Provision.as_str(),
            "Running {}",
            command_line(program, args)
        );

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SystemError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success() {
            warn!(
                log_type = LogType::Provision.as_str(),
                "`{}` exited with status {}",
                command_line(program, args),
                result.status
            );
        }
        Ok(result)
    }
}

/// Reports commands instead of running them. Every command "succeeds" with
/// empty output.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

#[async_trait]
impl SystemRunner for DryRunRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        info!(
            log_type = LogType::Provision.as_str(),
            "[dry-run] {}",
            command_line(program, args)
        );
        Ok(CommandOutput::default())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
