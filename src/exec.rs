//! Running external commands with captured output

use std::process::Command;
use thiserror::Error;
use tracing::info;

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed with [status_code: {code}] [stdout: {stdout}] [stderr: {stderr}]")]
    Failed {
        program: String,
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl CommandError {
    pub fn failed(program: &str, output: CommandOutput) -> Self {
        CommandError::Failed {
            program: program.to_string(),
            code: output.code,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs external programs
pub trait CommandRunner {
    /// Runs to completion and captures output. A non-zero exit is not an error.
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError>;

    /// Runs to completion, failing on a non-zero exit
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let output = self.output(program, args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(CommandError::failed(program, output))
        }
    }
}

/// Runs commands on the host, echoing each command line like a CI runner does
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner {
    secrets: Vec<String>,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values that are replaced by `***` in echoed command lines
    pub fn with_secrets(secrets: Vec<String>) -> Self {
        Self {
            secrets: secrets.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    fn display_line(&self, program: &str, args: &[String]) -> String {
        let mut line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        for secret in &self.secrets {
            line = line.replace(secret.as_str(), "***");
        }
        line
    }
}

impl CommandRunner for SystemCommandRunner {
    fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        info!("[command]{}", self.display_line(program, args));

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let captured = CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !captured.stdout.is_empty() {
            info!("{}", captured.stdout.trim_end());
        }

        Ok(captured)
    }
}

/// Builds an owned argument list
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
