//! `/merge_audio`, `/merge_video` and the media messages that feed them.
//!
//! A media message is handled in two steps. `accept` runs in message order
//! and reserves the file's place in the session; `finish` downloads it and
//! may run detached, so a large first file does not let a smaller second
//! one overtake it.

use std::sync::Arc;
use std::time::Duration;

use ffbot_core::{
    BotError, MediaKind, MergeJob, MergeMode, ProgressObserver, Reservation, SessionState,
};
use ffbot_media::{remove_files, MergeOutcome};
use tracing::{error, info, warn};

use crate::context::BotContext;
use crate::naming::{download_path, merge_output_path};
use crate::port::{ChatContext, IncomingMedia, MessageRef};
use crate::progress::StatusMessage;

pub const NO_SESSION_HINT: &str =
    "Please use /merge_audio or /merge_video to start the merging process.";
pub const UNKNOWN_KIND_HINT: &str = "Please send an audio or video file.";
pub const TOO_LARGE: &str = "The file is too large (over 2GB). Please provide a smaller file.";

/// Telegram rejects messages over 4096 characters.
const MAX_DIAGNOSTIC_CHARS: usize = 3500;

/// An accepted merge input that still has to be downloaded.
#[derive(Debug, Clone)]
pub struct PendingInput {
    media: IncomingMedia,
    mode: MergeMode,
    reservation: Reservation,
    status: MessageRef,
}

pub struct MergeHandler {
    ctx: Arc<BotContext>,
}

impl MergeHandler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Start (or restart) a merge session for the sender.
    pub async fn begin(&self, chat: &ChatContext, mode: MergeMode) -> Result<(), BotError> {
        if let Some(previous) = self.ctx.sessions.begin(chat.user, mode).await {
            let stale: Vec<_> = previous.files().into_iter().map(|f| f.path).collect();
            info!(
                user = %chat.user,
                files = stale.len(),
                downloading = previous.pending(),
                "Replaced unfinished merge session"
            );
            remove_files(&stale).await;
        }
        self.ctx.port.reply(chat, mode.first_prompt()).await?;
        Ok(())
    }

    /// Feed one media message into the sender's session and wait for it.
    /// Triggers the merge when it completes the pair.
    pub async fn receive(&self, chat: &ChatContext, media: &IncomingMedia) -> Result<(), BotError> {
        match self.accept(chat, media).await? {
            Some(input) => self.finish(chat, input).await,
            None => Ok(()),
        }
    }

    /// Validate a media message and reserve its slot. `None` means the file
    /// was refused and the user has been told why.
    pub async fn accept(
        &self,
        chat: &ChatContext,
        media: &IncomingMedia,
    ) -> Result<Option<PendingInput>, BotError> {
        let port = self.ctx.port.as_ref();
        let sessions = &self.ctx.sessions;

        let Some(mode) = sessions.mode(chat.user).await else {
            port.reply(chat, NO_SESSION_HINT).await?;
            return Ok(None);
        };
        let Some(kind) = media.kind else {
            port.reply(chat, UNKNOWN_KIND_HINT).await?;
            return Ok(None);
        };
        if media.file_size > self.ctx.settings.max_file_size {
            let err = BotError::FileTooLarge {
                size: media.file_size,
                limit: self.ctx.settings.max_file_size,
            };
            warn!(user = %chat.user, error = %err, "Rejected merge input");
            port.reply(chat, TOO_LARGE).await?;
            return Ok(None);
        }
        let reservation = match sessions.reserve(chat.user, kind).await {
            Ok(reservation) => reservation,
            Err(e) => {
                port.reply(chat, &e.to_string()).await?;
                return Ok(None);
            }
        };

        match port.reply(chat, &format!("Downloading {kind}...")).await {
            Ok(status) => Ok(Some(PendingInput {
                media: media.clone(),
                mode,
                reservation,
                status,
            })),
            Err(e) => {
                sessions.release(&reservation).await;
                Err(e.into())
            }
        }
    }

    /// Download an accepted input into its slot.
    pub async fn finish(&self, chat: &ChatContext, input: PendingInput) -> Result<(), BotError> {
        let port = self.ctx.port.as_ref();
        let sessions = &self.ctx.sessions;
        let PendingInput { media, mode, reservation, status } = input;
        let status = StatusMessage::new(port, status);
        let path = download_path(&self.ctx.settings.downloads_dir, chat.user, &media);

        if let Err(e) = port.download(&media, &path, &status).await {
            let err = BotError::Download(e.to_string());
            error!(user = %chat.user, error = %err, "Merge input not downloaded");
            sessions.release(&reservation).await;
            status.status(&format!("Error during download: {e}")).await;
            remove_files(&[&path]).await;
            return Ok(());
        }

        let state = match sessions.fill(&reservation, &path).await {
            Ok(state) => state,
            Err(e) => {
                // The session was restarted or purged while downloading.
                warn!(user = %chat.user, error = %e, "Downloaded file not accepted");
                remove_files(&[&path]).await;
                status.status(&e.to_string()).await;
                return Ok(());
            }
        };

        match state {
            SessionState::AwaitingFirst => {}
            SessionState::AwaitingSecond => {
                status.status(second_prompt(mode, reservation.kind)).await
            }
            SessionState::Ready => {
                status.status(ready_notice(mode)).await;
                self.run_merge(chat).await?;
            }
        }
        Ok(())
    }

    async fn run_merge(&self, chat: &ChatContext) -> Result<(), BotError> {
        // Taking the job removes the session, whatever the merge outcome.
        let Some(job) = self.ctx.sessions.consume(chat.user).await else {
            return Ok(());
        };
        let output = merge_output_path(&self.ctx.settings.downloads_dir, chat.user, job.mode);

        let result = self.merge_and_upload(chat, &job, &output).await;

        let mut paths: Vec<_> = job.inputs.iter().map(|f| f.path.clone()).collect();
        paths.push(output);
        remove_files(&paths).await;
        result
    }

    async fn merge_and_upload(
        &self,
        chat: &ChatContext,
        job: &MergeJob,
        output: &std::path::Path,
    ) -> Result<(), BotError> {
        let port = self.ctx.port.as_ref();
        let noun = match job.mode {
            MergeMode::Audio => "audio",
            MergeMode::Video => "video",
        };
        let working = match job.mode {
            MergeMode::Audio => "Merging audio files...",
            MergeMode::Video => "Merging video and audio...",
        };
        let status = StatusMessage::new(port, port.reply(chat, working).await?);

        match self.ctx.toolkit.merge(job, output).await {
            MergeOutcome::Merged => {
                status
                    .status(&format!("Merging complete, uploading the merged {noun}..."))
                    .await;
                let caption = format!("Here is your merged {noun} file!");
                if let Err(e) = port.send_document(chat.chat_id, output, &caption, &status).await {
                    error!(user = %chat.user, error = %e, "Failed to upload merge output");
                    status
                        .status(&format!("Failed to upload the merged {noun}: {e}"))
                        .await;
                } else {
                    info!(user = %chat.user, mode = %job.mode, "Merged file delivered");
                }
            }
            MergeOutcome::MissingOutput => {
                warn!(user = %chat.user, output = %output.display(), "Merge output missing");
                status
                    .status("Merging completed, but the output file was not found.")
                    .await;
            }
            MergeOutcome::Failed(stderr) => {
                error!(user = %chat.user, stderr = %stderr, "Failed to merge");
                status
                    .status(&format!("Failed to merge: {}", tail(&stderr, MAX_DIAGNOSTIC_CHARS)))
                    .await;
            }
        }
        Ok(())
    }

    /// Drop sessions idle for longer than `max_age` and delete their files.
    pub async fn purge_stale(&self, max_age: Duration) -> usize {
        let stale = self.ctx.sessions.purge_older_than(max_age).await;
        let paths: Vec<_> = stale
            .iter()
            .flat_map(|s| s.files().into_iter().map(|f| f.path))
            .collect();
        if !stale.is_empty() {
            info!(sessions = stale.len(), files = paths.len(), "Purged stale merge sessions");
        }
        remove_files(&paths).await;
        stale.len()
    }
}

fn second_prompt(mode: MergeMode, received: MediaKind) -> &'static str {
    match (mode, received) {
        (MergeMode::Audio, _) => "First audio received. Now send the second audio.",
        (MergeMode::Video, MediaKind::Video) => "Video received. Now send the audio file.",
        (MergeMode::Video, MediaKind::Audio) => "Audio received. Now send the video file.",
    }
}

fn ready_notice(mode: MergeMode) -> &'static str {
    match mode {
        MergeMode::Audio => "Both audios received. Merging them now...",
        MergeMode::Video => "Both video and audio received. Merging them now...",
    }
}

/// Last `max` characters of `text`; ffmpeg puts the actual error at the end.
fn tail(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    let skip = count - max;
    let start = text.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(0);
    &text[start..]
}
