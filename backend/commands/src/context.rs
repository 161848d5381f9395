use std::path::PathBuf;
use std::sync::Arc;

use ffbot_core::{SessionStore, MAX_FILE_SIZE};
use ffbot_media::MediaToolkit;

use crate::port::ChatPort;

/// Knobs the handlers need from configuration.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Where user uploads are stored while a request is in flight.
    pub downloads_dir: PathBuf,
    /// Scratch space for transform outputs and screenshots.
    pub temp_dir: PathBuf,
    pub max_file_size: u64,
    pub screenshot_offset_secs: f64,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            temp_dir: std::env::temp_dir(),
            max_file_size: MAX_FILE_SIZE,
            screenshot_offset_secs: 5.0,
        }
    }
}

/// Everything a handler touches, shared across all events.
pub struct BotContext {
    pub port: Arc<dyn ChatPort>,
    pub toolkit: Arc<MediaToolkit>,
    pub sessions: Arc<SessionStore>,
    pub settings: HandlerSettings,
}

impl BotContext {
    pub fn new(
        port: Arc<dyn ChatPort>,
        toolkit: Arc<MediaToolkit>,
        sessions: Arc<SessionStore>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            port,
            toolkit,
            sessions,
            settings,
        }
    }

    /// Create the downloads and scratch directories if absent.
    pub async fn prepare_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.settings.downloads_dir).await?;
        tokio::fs::create_dir_all(&self.settings.temp_dir).await
    }
}
