//! Execution of rendered command lines.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use getset::Getters;
use std::fmt::Debug;
use std::process::Command;

/// What an external process left behind once it exited.
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct CommandOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    pub fn new(success: bool, code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            success,
            code,
            stdout,
            stderr,
        }
    }

    pub fn succeeded() -> Self {
        Self::new(true, Some(0), String::new(), String::new())
    }

    pub fn failed(code: i32, stderr: &str) -> Self {
        Self::new(false, Some(code), String::new(), stderr.to_string())
    }

    /// Short description of a failed exit for error messages.
    pub fn failure_reason(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".to_string(),
        };
        match self.stderr.trim() {
            "" => status,
            stderr => format!("{status}: {stderr}"),
        }
    }
}

/// Runs one command line to completion. There is no timeout.
pub trait CommandRunner: Debug {
    fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// Runs commands through `sh -c`, so redirection tokens such as `> file` work.
#[derive(Clone, Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        tracing::debug!("Executing: {}", command);
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| Error::tool(command, format!("cannot spawn shell: {e}")))?;

        let output = CommandOutput::new(
            output.status.success(),
            output.status.code(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        );
        tracing::trace!("stdout of {}:\n{}", command, output.stdout);
        if !output.stderr.is_empty() {
            tracing::debug!("stderr of {}:\n{}", command, output.stderr);
        }
        Ok(output)
    }
}
