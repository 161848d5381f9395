use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Telegram user identifier, the key of every merge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which pair of inputs a merge session expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Two audio tracks concatenated end to end.
    Audio,
    /// One video stream muxed with one audio stream.
    Video,
}

impl MergeMode {
    /// Prompt sent right after the session starts.
    pub fn first_prompt(self) -> &'static str {
        match self {
            MergeMode::Audio => "Send the first audio file.",
            MergeMode::Video => "Send the video file.",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Audio => f.write_str("audio"),
            MergeMode::Video => f.write_str("video"),
        }
    }
}

/// Kind of an attachment as tagged by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn other(self) -> Self {
        match self {
            MediaKind::Audio => MediaKind::Video,
            MediaKind::Video => MediaKind::Audio,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// A downloaded file held by a merge session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl ReceivedFile {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self { path: path.into(), kind }
    }
}
