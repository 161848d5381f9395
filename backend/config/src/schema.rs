//! ffbot configuration schema.
//!
//! Every section and field is optional in the file; `defaults` fills in the
//! gaps and the accessors below read the prepared values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::{
    DEFAULT_DOWNLOADS_DIR, DEFAULT_FFMPEG, DEFAULT_FFPROBE, DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_SCREENSHOT_OFFSET_SECS, DEFAULT_WORKER_THREADS,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,

    /// Download and scratch directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsConfig>,

    /// External media tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Self-hosted Bot API server, e.g. `http://localhost:8081`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffprobe: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_bytes: Option<u64>,
    /// Concurrent blocking transforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_offset_secs: Option<f64>,
    /// 0 keeps merge sessions until they complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl BotConfig {
    pub fn token(&self) -> Option<&str> {
        self.telegram
            .as_ref()
            .and_then(|t| t.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn api_url(&self) -> Option<&str> {
        self.telegram.as_ref().and_then(|t| t.api_url.as_deref())
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.paths
            .as_ref()
            .and_then(|p| p.downloads_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADS_DIR))
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.paths
            .as_ref()
            .and_then(|p| p.temp_dir.clone())
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn ffmpeg(&self) -> &str {
        self.tools
            .as_ref()
            .and_then(|t| t.ffmpeg.as_deref())
            .unwrap_or(DEFAULT_FFMPEG)
    }

    pub fn ffprobe(&self) -> &str {
        self.tools
            .as_ref()
            .and_then(|t| t.ffprobe.as_deref())
            .unwrap_or(DEFAULT_FFPROBE)
    }

    pub fn max_file_size(&self) -> u64 {
        self.limits
            .as_ref()
            .and_then(|l| l.max_file_size_bytes)
            .unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    pub fn worker_threads(&self) -> usize {
        self.limits
            .as_ref()
            .and_then(|l| l.worker_threads)
            .unwrap_or(DEFAULT_WORKER_THREADS)
    }

    pub fn screenshot_offset_secs(&self) -> f64 {
        self.limits
            .as_ref()
            .and_then(|l| l.screenshot_offset_secs)
            .unwrap_or(DEFAULT_SCREENSHOT_OFFSET_SECS)
    }

    /// `None` when sessions never expire.
    pub fn session_ttl(&self) -> Option<Duration> {
        self.limits
            .as_ref()
            .and_then(|l| l.session_ttl_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }
}
