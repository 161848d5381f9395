//! Recording `ChatPort` and a ready-made handler context for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use ffbot_core::{ProgressObserver, SessionStore, UserId};
use ffbot_media::testing::FakeRunner;
use ffbot_media::{FfmpegCommands, MediaToolkit, WorkerPool};
use tempfile::TempDir;

use crate::context::{BotContext, HandlerSettings};
use crate::port::{ChatContext, ChatPort, IncomingMedia, MessageRef};

pub const CHAT_ID: i64 = 100;
pub const USER: UserId = UserId(42);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Video { caption: String, path: PathBuf, existed: bool },
    Document { caption: String, path: PathBuf, existed: bool },
}

#[derive(Default)]
pub struct FakePort {
    next_id: AtomicI32,
    replies: Mutex<Vec<String>>,
    edits: Mutex<Vec<String>>,
    sent: Mutex<Vec<Sent>>,
    downloads: Mutex<Vec<String>>,
    deleted: AtomicUsize,
    slow_downloads: HashMap<String, Duration>,
    fail_downloads: bool,
    fail_uploads: bool,
}

impl FakePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_downloads(mut self) -> Self {
        self.fail_downloads = true;
        self
    }

    /// Delay the download of `file_id` by `delay`.
    pub fn slow_download(mut self, file_id: &str, delay: Duration) -> Self {
        self.slow_downloads.insert(file_id.to_string(), delay);
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn chat(&self) -> ChatContext {
        ChatContext { chat_id: CHAT_ID, user: USER, message_id: 1 }
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<String> {
        self.edits.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// File ids passed to `download`, in order.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }

    fn message(&self, chat_id: i64) -> MessageRef {
        MessageRef { chat_id, message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1000 }
    }

    async fn upload(&self, path: &Path, progress: &dyn ProgressObserver) -> Result<bool> {
        if self.fail_uploads {
            bail!("Request Entity Too Large");
        }
        let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        progress.transfer("Uploading...", size, size).await;
        Ok(path.exists())
    }
}

#[async_trait]
impl ChatPort for FakePort {
    async fn reply(&self, chat: &ChatContext, text: &str) -> Result<MessageRef> {
        self.replies.lock().unwrap().push(text.to_string());
        Ok(self.message(chat.chat_id))
    }

    async fn edit_text(&self, _message: MessageRef, text: &str) -> Result<()> {
        self.edits.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn delete_message(&self, _message: MessageRef) -> Result<()> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download(
        &self,
        media: &IncomingMedia,
        dest: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        self.downloads.lock().unwrap().push(media.file_id.clone());
        if let Some(delay) = self.slow_downloads.get(&media.file_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_downloads {
            bail!("file is temporarily unavailable");
        }
        progress.transfer("Downloading...", media.file_size, media.file_size).await;
        tokio::fs::write(dest, b"media bytes").await?;
        Ok(())
    }

    async fn send_video(
        &self,
        _chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        let existed = self.upload(path, progress).await?;
        self.sent.lock().unwrap().push(Sent::Video {
            caption: caption.to_string(),
            path: path.to_path_buf(),
            existed,
        });
        Ok(())
    }

    async fn send_document(
        &self,
        _chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        let existed = self.upload(path, progress).await?;
        self.sent.lock().unwrap().push(Sent::Document {
            caption: caption.to_string(),
            path: path.to_path_buf(),
            existed,
        });
        Ok(())
    }
}

pub struct Harness {
    pub ctx: Arc<BotContext>,
    pub port: Arc<FakePort>,
    pub runner: Arc<FakeRunner>,
    /// Downloads and scratch directories, removed on drop.
    pub _dirs: (TempDir, TempDir),
}

pub fn harness(runner: FakeRunner, port: FakePort) -> Harness {
    let downloads = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(runner);
    let port = Arc::new(port);

    let toolkit = MediaToolkit::new(runner.clone(), FfmpegCommands::default(), WorkerPool::new(2));
    let settings = HandlerSettings {
        downloads_dir: downloads.path().to_path_buf(),
        temp_dir: temp.path().to_path_buf(),
        ..HandlerSettings::default()
    };
    let ctx = BotContext::new(
        port.clone(),
        Arc::new(toolkit),
        Arc::new(SessionStore::new()),
        settings,
    );

    Harness { ctx: Arc::new(ctx), port, runner, _dirs: (downloads, temp) }
}
