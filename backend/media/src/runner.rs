//! External tool runner.
//!
//! One seam for every `ffmpeg`/`ffprobe` call so tests can swap in a fake and
//! assert on argument lists without touching real binaries.

use std::fmt;
use std::process::{Output, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ffbot_core::BotError;
use ffbot_logging::{EventLogger, MediaEvent};
use tracing::{debug, warn};

/// A program plus its fixed argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal.
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    /// Turn a non-zero exit into `BotError::ToolFailed` carrying stderr.
    pub fn into_result(self, program: &str) -> Result<Self, BotError> {
        if self.success() {
            Ok(self)
        } else {
            Err(BotError::ToolFailed {
                program: program.to_string(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }

    fn from_process(output: Output) -> Self {
        Self {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs external tools. `Err` means the tool could not be started at all;
/// a non-zero exit is an `Ok` output with `success() == false`.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Spawn without blocking the async runtime.
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;

    /// Run on the calling thread. Only call this from a blocking context.
    fn run_blocking(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "Spawning tool");
        let started = Instant::now();

        let output = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to start {}", invocation.program))?;

        let output = ToolOutput::from_process(output);
        record(invocation, &output, started);
        Ok(output)
    }

    fn run_blocking(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "Running tool (blocking)");
        let started = Instant::now();

        let output = std::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to start {}", invocation.program))?;

        let output = ToolOutput::from_process(output);
        record(invocation, &output, started);
        Ok(output)
    }
}

fn record(invocation: &ToolInvocation, output: &ToolOutput, started: Instant) {
    if !output.success() {
        warn!(
            program = %invocation.program,
            code = ?output.status_code,
            stderr = %output.stderr.trim(),
            "Tool exited with failure"
        );
    }
    EventLogger::log_event(
        &invocation.program,
        MediaEvent::ToolRun {
            program: invocation.program.clone(),
            args: invocation.args.clone(),
            success: output.success(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
    );
}
