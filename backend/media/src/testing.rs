//! In-memory `ToolRunner` for tests: records invocations and fakes outputs.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use crate::runner::{ToolInvocation, ToolOutput, ToolRunner};

/// Pretends to be ffmpeg/ffprobe.
///
/// Successful ffmpeg calls write a small file at their last argument (a real
/// JPEG for `.jpg` targets). Rules match when any argument contains the
/// given needle.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    blocking: AtomicUsize,
    failures: Vec<(String, String)>,
    skipped_outputs: Vec<String>,
    probe_stdout: Option<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit 1 with `stderr` for invocations containing `needle`.
    pub fn fail_when(mut self, needle: &str, stderr: &str) -> Self {
        self.failures.push((needle.to_string(), stderr.to_string()));
        self
    }

    /// Exit 0 without writing the output file for invocations containing `needle`.
    pub fn skip_output_when(mut self, needle: &str) -> Self {
        self.skipped_outputs.push(needle.to_string());
        self
    }

    /// Stdout returned for ffprobe calls.
    pub fn with_probe(mut self, stdout: &str) -> Self {
        self.probe_stdout = Some(stdout.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn blocking_calls(&self) -> usize {
        self.blocking.load(Ordering::SeqCst)
    }

    fn matches(invocation: &ToolInvocation, needle: &str) -> bool {
        invocation.args.iter().any(|a| a.contains(needle))
    }

    fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        if let Some((_, stderr)) = self
            .failures
            .iter()
            .find(|(needle, _)| Self::matches(invocation, needle))
        {
            return Ok(ToolOutput {
                status_code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }

        if Self::matches(invocation, "-show_entries") {
            return Ok(ToolOutput {
                status_code: Some(0),
                stdout: self.probe_stdout.clone().unwrap_or_default(),
                stderr: String::new(),
            });
        }

        let skip = self
            .skipped_outputs
            .iter()
            .any(|needle| Self::matches(invocation, needle));
        if !skip && !Self::matches(invocation, "-version") {
            if let Some(target) = invocation.args.last() {
                write_fake_output(Path::new(target))?;
            }
        }

        Ok(ToolOutput {
            status_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn write_fake_output(path: &Path) -> Result<()> {
    if path.extension().is_some_and(|e| e == "jpg") {
        image::RgbImage::from_pixel(8, 6, image::Rgb([120, 80, 40]))
            .save_with_format(path, image::ImageFormat::Jpeg)?;
    } else {
        std::fs::write(path, b"fake output")?;
    }
    Ok(())
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.execute(invocation)
    }

    fn run_blocking(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.blocking.fetch_add(1, Ordering::SeqCst);
        self.execute(invocation)
    }
}
