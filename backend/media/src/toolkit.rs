//! Media transform operations built on the tool runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ffbot_core::{BotError, MergeJob, MergeMode};
use ffbot_logging::{EventLogger, MediaEvent};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cleanup::remove_files;
use crate::ffmpeg::FfmpegCommands;
use crate::pool::WorkerPool;
use crate::probe::{parse_probe_output, MediaDetails};
use crate::runner::ToolRunner;
use crate::thumbnail::fix_thumbnail;

/// How a merge invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Tool succeeded and the output file exists.
    Merged,
    /// Tool reported success but the output file is not there.
    MissingOutput,
    /// Tool failed; carries its diagnostic text.
    Failed(String),
}

/// Stateless transforms over media files.
pub struct MediaToolkit {
    runner: Arc<dyn ToolRunner>,
    commands: FfmpegCommands,
    pool: WorkerPool,
}

impl MediaToolkit {
    pub fn new(runner: Arc<dyn ToolRunner>, commands: FfmpegCommands, pool: WorkerPool) -> Self {
        Self {
            runner,
            commands,
            pool,
        }
    }

    /// Strip the audio track from `input` into `output`. Runs on the worker
    /// pool because it may take a long time on big files.
    pub async fn remove_audio(&self, input: &Path, output: &Path) -> Result<(), BotError> {
        let invocation = self.commands.remove_audio(input, output);
        let program = invocation.program.clone();
        let runner = Arc::clone(&self.runner);

        info!(input = %input.display(), output = %output.display(), "Removing audio track");
        let result = self
            .pool
            .run(move || runner.run_blocking(&invocation))
            .await??;

        result.into_result(&program).map(|_| ()).inspect_err(|e| {
            EventLogger::log_event(
                &output.display().to_string(),
                MediaEvent::TransformFailed {
                    operation: "remove_audio".into(),
                    error_msg: e.to_string(),
                },
            );
        })
    }

    /// Grab one JPEG frame from `input` into `out_dir`. `None` if the tool
    /// produced no file, whatever its exit status.
    pub async fn take_screenshot(
        &self,
        input: &Path,
        out_dir: &Path,
        offset_secs: f64,
    ) -> Option<PathBuf> {
        let output = out_dir.join(format!("{}.jpg", Uuid::new_v4()));
        let invocation = self.commands.screenshot(input, offset_secs, &output);
        if let Err(e) = self.runner.run(&invocation).await {
            warn!(error = %e, "Screenshot tool could not run");
        }
        tokio::fs::try_exists(&output)
            .await
            .unwrap_or(false)
            .then_some(output)
    }

    /// Attach `thumbnail` to `target` as cover art, replacing `target`.
    pub async fn embed_thumbnail(&self, target: &Path, thumbnail: &Path) -> Result<(), BotError> {
        let staging = staging_path(target);
        let invocation = self.commands.attach_thumbnail(target, thumbnail, &staging);

        let output = self.runner.run(&invocation).await?;
        if let Err(e) = output.into_result(&invocation.program) {
            remove_files(&[&staging]).await;
            return Err(e);
        }
        if !tokio::fs::try_exists(&staging).await.unwrap_or(false) {
            return Err(BotError::MissingOutput(staging));
        }
        tokio::fs::rename(&staging, target).await?;
        Ok(())
    }

    /// Screenshot `source` → normalize → embed into `target`. Every failure
    /// here is logged and swallowed; returns whether a thumbnail was attached.
    pub async fn attach_preview_thumbnail(
        &self,
        source: &Path,
        target: &Path,
        scratch_dir: &Path,
        offset_secs: f64,
    ) -> bool {
        let Some(shot) = self.take_screenshot(source, scratch_dir, offset_secs).await else {
            warn!(source = %source.display(), "Failed to take screenshot");
            return false;
        };

        let attached = match fix_thumbnail(Some(shot.clone())).await {
            Some(fixed) => match self.embed_thumbnail(target, &fixed.path).await {
                Ok(()) => {
                    info!(target = %target.display(), "Thumbnail set successfully");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Failed to set thumbnail");
                    false
                }
            },
            None => {
                warn!("Failed to fix thumbnail");
                false
            }
        };

        remove_files(&[&shot]).await;
        attached
    }

    /// Duration and size of `path`, or `None` if probing fails.
    pub async fn probe(&self, path: &Path) -> Option<MediaDetails> {
        let invocation = self.commands.probe_format(path);
        match self.runner.run(&invocation).await {
            Ok(out) if out.success() => parse_probe_output(&out.stdout),
            Ok(out) => {
                warn!(stderr = %out.stderr.trim(), "ffprobe failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "ffprobe could not run");
                None
            }
        }
    }

    /// Run the merge for a complete job, writing to `output`.
    pub async fn merge(&self, job: &MergeJob, output: &Path) -> MergeOutcome {
        let [first, second] = match job.inputs.as_slice() {
            [a, b] => [&a.path, &b.path],
            other => {
                return MergeOutcome::Failed(format!("expected 2 inputs, got {}", other.len()));
            }
        };
        let invocation = match job.mode {
            MergeMode::Audio => self.commands.concat_audio(first, second, output),
            MergeMode::Video => self.commands.mux_video_audio(first, second, output),
        };

        let outcome = match self.runner.run(&invocation).await {
            Ok(out) if out.success() => {
                if tokio::fs::try_exists(output).await.unwrap_or(false) {
                    MergeOutcome::Merged
                } else {
                    MergeOutcome::MissingOutput
                }
            }
            Ok(out) => MergeOutcome::Failed(out.stderr.trim().to_string()),
            Err(e) => MergeOutcome::Failed(e.to_string()),
        };

        EventLogger::log_event(
            &job.user.to_string(),
            MediaEvent::MergeFinished {
                mode: job.mode.to_string(),
                outcome: format!("{outcome:?}"),
            },
        );
        outcome
    }
}

/// Sibling path used while rewriting `target`.
fn staging_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match target.extension() {
        Some(ext) => format!("{stem}.thumb.{}", ext.to_string_lossy()),
        None => format!("{stem}.thumb"),
    };
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;
    use ffbot_core::{MediaKind, ReceivedFile, UserId};

    fn toolkit(runner: Arc<FakeRunner>) -> MediaToolkit {
        MediaToolkit::new(runner, FfmpegCommands::default(), WorkerPool::new(2))
    }

    #[tokio::test]
    async fn remove_audio_runs_on_pool_and_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let kit = toolkit(Arc::clone(&runner));
        let out = dir.path().join("out.mp4");

        kit.remove_audio(&dir.path().join("in.mp4"), &out).await.unwrap();
        assert!(out.exists());
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].args.contains(&"-an".to_string()));
        assert_eq!(runner.blocking_calls(), 1);
    }

    #[tokio::test]
    async fn remove_audio_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new().fail_when("-an", "moov atom not found"));
        let kit = toolkit(runner);
        let err = kit
            .remove_audio(&dir.path().join("in.mp4"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("moov atom not found"));
    }

    #[tokio::test]
    async fn screenshot_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new().skip_output_when("-vframes"));
        let kit = toolkit(runner);
        assert!(kit.take_screenshot(&dir.path().join("in.mp4"), dir.path(), 5.0).await.is_none());
    }

    #[tokio::test]
    async fn embed_thumbnail_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("clip.mp4");
        std::fs::write(&target, b"original").unwrap();
        let runner = Arc::new(FakeRunner::new());
        let kit = toolkit(Arc::clone(&runner));

        kit.embed_thumbnail(&target, &dir.path().join("t.jpg")).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"fake output");
        assert!(!dir.path().join("clip.thumb.mp4").exists());
    }

    #[tokio::test]
    async fn probe_parses_fake_output() {
        let runner = Arc::new(FakeRunner::new().with_probe("duration=10.4\nsize=2097152\n"));
        let kit = toolkit(runner);
        let details = kit.probe(Path::new("x.mp4")).await.unwrap();
        assert_eq!(details.rounded_secs(), 10);
        assert_eq!(details.size_mb(), 2.0);
    }

    #[tokio::test]
    async fn merge_reports_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new().skip_output_when("concat=n=2:v=0:a=1[out]"));
        let kit = toolkit(runner);
        let job = MergeJob {
            user: UserId(7),
            mode: MergeMode::Audio,
            inputs: vec![
                ReceivedFile::new(dir.path().join("a.mp3"), MediaKind::Audio),
                ReceivedFile::new(dir.path().join("b.mp3"), MediaKind::Audio),
            ],
        };
        let outcome = kit.merge(&job, &dir.path().join("merged.mp3")).await;
        assert_eq!(outcome, MergeOutcome::MissingOutput);
    }

    #[tokio::test]
    async fn merge_video_uses_mux_command() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let kit = toolkit(Arc::clone(&runner));
        let job = MergeJob {
            user: UserId(7),
            mode: MergeMode::Video,
            inputs: vec![
                ReceivedFile::new(dir.path().join("v.mp4"), MediaKind::Video),
                ReceivedFile::new(dir.path().join("a.mp3"), MediaKind::Audio),
            ],
        };
        let out = dir.path().join("merged.mp4");
        assert_eq!(kit.merge(&job, &out).await, MergeOutcome::Merged);
        assert!(runner.calls()[0].args.contains(&"aac".to_string()));
    }

    #[test]
    fn staging_path_keeps_extension() {
        assert_eq!(
            staging_path(Path::new("/tmp/x_noaudio.mp4")),
            PathBuf::from("/tmp/x_noaudio.thumb.mp4")
        );
    }
}
