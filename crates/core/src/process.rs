//! Process execution utilities
//!
//! External commands are executed through the [`CommandRunner`] capability so
//! callers receive the runner explicitly and tests can substitute a scripted one.

use crate::error::{Error, Result};
use std::process::{Command, Output, Stdio};

/// Result of a command execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// A successful result with the given standard output
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and standard error
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Standard output with surrounding newlines removed
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim_matches(|c| c == '\n' || c == '\r')
    }
}

/// Render a program and its arguments the way a shell would show them
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capability for running external commands
pub trait CommandRunner {
    /// Run a command and capture its output.
    ///
    /// Fails only when the command could not be started; a non-zero exit is
    /// reported through [`CommandResult::success`].
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandResult>;

    /// Run a command and treat a non-zero exit as an error
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandResult> {
        let result = self.run(program, args)?;
        if result.success {
            Ok(result)
        } else {
            Err(Error::command_failed(
                &command_line(program, args),
                result.exit_code,
                &result.stderr,
            ))
        }
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandResult> {
        (**self).run(program, args)
    }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandResult> {
        tracing::debug!(command = %command_line(program, args), "Running command");

        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::command_not_found(program).with_source(e),
                _ => Error::process(format!("Failed to execute {}: {}", program, e)).with_source(e),
            })?;

        let result = CommandResult::from_output(output);
        tracing::trace!(
            exit_code = result.exit_code,
            stdout = %result.stdout,
            stderr = %result.stderr,
            "Command finished"
        );
        Ok(result)
    }
}
