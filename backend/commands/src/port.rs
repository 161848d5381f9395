//! The bot's view of the chat platform.
//!
//! Handlers only talk to `ChatPort`; the Telegram adapter implements it and
//! tests substitute a recording fake.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use ffbot_core::{MediaKind, ProgressObserver, UserId};

/// Where an inbound event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatContext {
    pub chat_id: i64,
    pub user: UserId,
    /// The message being answered; replies thread under it.
    pub message_id: i32,
}

/// A message the bot sent and may edit later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// An attachment that can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMedia {
    pub file_id: String,
    pub file_name: Option<String>,
    pub file_size: u64,
    pub mime_type: Option<String>,
    /// `None` for documents whose type could not be determined.
    pub kind: Option<MediaKind>,
}

#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Reply to the message described by `chat`.
    async fn reply(&self, chat: &ChatContext, text: &str) -> Result<MessageRef>;

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<()>;

    async fn delete_message(&self, message: MessageRef) -> Result<()>;

    /// Fetch `media` into `dest`, reporting transfer progress.
    async fn download(
        &self,
        media: &IncomingMedia,
        dest: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<()>;

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<()>;

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<()>;
}
