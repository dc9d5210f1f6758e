//! External command seam
//!
//! Every docker/kubectl/backend invocation goes through [`CommandRunner`]
//! so the orchestrator and backend logic can be exercised against a
//! scripted runner in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one external invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Abstraction over external process execution for testability.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command to completion. `Err` means the command could not be
    /// spawned at all; a non-zero exit is a successful `run` with
    /// `success == false`.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runner backed by real child processes.
pub struct RealCommandRunner;

#[async_trait]
impl CommandRunner for RealCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!(program, args = ?args, "Running external command");
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to spawn '{}'", program))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Scripted runner for tests: records every call and answers according to
/// substring rules registered up front.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<String>>,
    responses: Vec<(String, CommandOutput)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any command line containing `needle` answers with `output`. Rules are
    /// matched in registration order; unmatched commands succeed with empty
    /// output.
    pub fn respond(mut self, needle: &str, output: CommandOutput) -> Self {
        self.responses.push((needle.to_string(), output));
        self
    }

    /// Shorthand for a failing rule.
    pub fn fail_when(self, needle: &str) -> Self {
        self.respond(needle, CommandOutput::failed("scripted failure"))
    }

    /// Full command lines observed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of observed calls whose program matches.
    pub fn count_program(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|line| line.split_whitespace().next() == Some(program))
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        for (needle, output) in &self.responses {
            if line.contains(needle.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(CommandOutput::ok(""))
    }
}
