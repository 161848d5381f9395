//! `ffbot check-tools`: verify ffmpeg and ffprobe can be started.

use anyhow::{bail, Result};
use ffbot_media::{FfmpegCommands, ToolRunner};

use crate::terminal_output::{note_error, note_success};

/// Result of one `-version` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    pub program: String,
    /// First line of `-version` output, or the failure reason.
    pub detail: String,
    pub ok: bool,
}

pub async fn check_tools(runner: &dyn ToolRunner, commands: &FfmpegCommands) -> Vec<ToolCheck> {
    let mut checks = Vec::new();
    for invocation in commands.version_checks() {
        let check = match runner.run(&invocation).await {
            Ok(out) if out.success() => ToolCheck {
                program: invocation.program.clone(),
                detail: out.stdout.lines().next().unwrap_or("").trim().to_string(),
                ok: true,
            },
            Ok(out) => ToolCheck {
                program: invocation.program.clone(),
                detail: format!("exited with {:?}: {}", out.status_code, out.stderr.trim()),
                ok: false,
            },
            Err(e) => ToolCheck {
                program: invocation.program.clone(),
                detail: format!("{e:#}"),
                ok: false,
            },
        };
        checks.push(check);
    }
    checks
}

/// Print the checks and fail if any tool is unusable.
pub async fn run(runner: &dyn ToolRunner, commands: &FfmpegCommands) -> Result<()> {
    println!("Checking media tools:");
    let checks = check_tools(runner, commands).await;
    for check in &checks {
        let line = format!("{} {}", check.program, check.detail);
        if check.ok {
            note_success(line.trim_end());
        } else {
            note_error(&line);
        }
    }
    if checks.iter().any(|c| !c.ok) {
        bail!("required media tools are missing or broken");
    }
    Ok(())
}
