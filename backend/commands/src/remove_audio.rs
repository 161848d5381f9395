//! `/remove_audio`: strip the audio track from a replied-to video.

use std::path::Path;
use std::sync::Arc;

use ffbot_core::{BotError, ProgressObserver};
use ffbot_media::{cleaned_video_caption, remove_files};
use tracing::{debug, error, info};

use crate::context::BotContext;
use crate::naming::{download_path, no_audio_path};
use crate::port::{ChatContext, IncomingMedia};
use crate::progress::StatusMessage;

pub const USAGE: &str = "Please reply to a video or document message with the /remove_audio command.";

pub struct RemoveAudioHandler {
    ctx: Arc<BotContext>,
}

impl RemoveAudioHandler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Download → strip audio → best-effort thumbnail and caption → upload →
    /// delete both files. Upload faults propagate after cleanup.
    pub async fn handle(
        &self,
        chat: &ChatContext,
        replied: Option<&IncomingMedia>,
    ) -> Result<(), BotError> {
        let port = self.ctx.port.as_ref();
        let Some(media) = replied else {
            debug!(user = %chat.user, "{}", BotError::MissingReply);
            port.reply(chat, USAGE).await?;
            return Ok(());
        };

        let status = StatusMessage::new(port, port.reply(chat, "Downloading media...").await?);
        let input = download_path(&self.ctx.settings.downloads_dir, chat.user, media);

        if let Err(e) = port.download(media, &input, &status).await {
            let err = BotError::Download(e.to_string());
            error!(user = %chat.user, error = %err, "Error downloading media");
            status.status("An error occurred while downloading.").await;
            remove_files(&[&input]).await;
            return Ok(());
        }

        status.status("Processing media...").await;
        let output = no_audio_path(&self.ctx.settings.temp_dir, &input);

        if let Err(e) = self.ctx.toolkit.remove_audio(&input, &output).await {
            error!(user = %chat.user, error = %e, "Audio removal failed");
            port.reply(chat, "Failed to process the video. Please try again later.").await?;
            remove_files(&[&input, &output]).await;
            return Ok(());
        }

        let result = self.finish(chat, &input, &output, &status).await;
        remove_files(&[&input, &output]).await;
        result
    }

    async fn finish(
        &self,
        chat: &ChatContext,
        input: &Path,
        output: &Path,
        status: &StatusMessage<'_>,
    ) -> Result<(), BotError> {
        let settings = &self.ctx.settings;
        self.ctx
            .toolkit
            .attach_preview_thumbnail(input, output, &settings.temp_dir, settings.screenshot_offset_secs)
            .await;

        let details = self.ctx.toolkit.probe(output).await;
        let caption = cleaned_video_caption(details.as_ref());

        status.status("Uploading media...").await;
        self.ctx
            .port
            .send_video(chat.chat_id, output, &caption, status)
            .await
            .map_err(|e| BotError::Upload(e.to_string()))?;

        info!(user = %chat.user, output = %output.display(), "Sent video without audio");
        status.delete().await;
        Ok(())
    }
}
