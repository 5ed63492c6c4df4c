use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CommandOutput, SystemError, SystemRunner, command_line};

#[derive(Debug, Clone)]
struct Script {
    prefix: String,
    output: CommandOutput,
}

#[derive(Debug, Default)]
struct RecordingState {
    scripts: Vec<Script>,
    commands: Vec<String>,
}

/// Records every command line and answers from scripted outputs. A script
/// matches when the command line starts with its prefix; the most recently
/// added match wins and unmatched commands succeed silently.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(self, prefix: &str, output: CommandOutput) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.scripts.push(Script {
                prefix: prefix.to_string(),
                output,
            });
        }
        self
    }

    pub fn with_status(self, prefix: &str, status: i32) -> Self {
        self.with_output(
            prefix,
            CommandOutput {
                status,
                ..CommandOutput::default()
            },
        )
    }

    pub fn with_stderr(self, prefix: &str, stderr: &str) -> Self {
        self.with_output(
            prefix,
            CommandOutput {
                stderr: stderr.to_string(),
                ..CommandOutput::default()
            },
        )
    }

    pub fn commands(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.commands.clone())
            .unwrap_or_default()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.commands().iter().any(|c| c.starts_with(prefix))
    }

    /// Index of the first command starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl SystemRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, SystemError> {
        let line = command_line(program, args);
        let mut state = self.state.lock().map_err(|_| SystemError::Spawn {
            program: program.to_string(),
            source: std::io::Error::other("recording runner poisoned"),
        })?;
        state.commands.push(line.clone());

        Ok(state
            .scripts
            .iter()
            .rev()
            .find(|s| line.starts_with(&s.prefix))
            .map(|s| s.output.clone())
            .unwrap_or_default())
    }
}
