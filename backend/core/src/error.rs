use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionError;

/// Top-level error type for the ffbot runtime.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("please reply to a video or document message with /remove_audio")]
    MissingReply,

    #[error("file is too large ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("download failed: {0}")]
    Download(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("{program} failed: {stderr}")]
    ToolFailed { program: String, stderr: String },

    #[error("tool finished but produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    /// True for errors caused by what the user sent rather than by the bot.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BotError::MissingReply | BotError::FileTooLarge { .. } | BotError::Session(_)
        )
    }
}
