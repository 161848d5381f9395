//! File names for downloads and transform outputs.

use std::path::{Path, PathBuf};

use ffbot_core::{MergeMode, UserId};
use ffbot_media::default_extension;
use uuid::Uuid;

use crate::port::IncomingMedia;

/// Keep only characters that are safe in a file name.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() { "file".to_string() } else { trimmed.to_string() }
}

/// Unique download target for `media` inside `dir`.
pub fn download_path(dir: &Path, user: UserId, media: &IncomingMedia) -> PathBuf {
    let name = match (&media.file_name, media.kind) {
        (Some(name), _) => sanitize(name),
        (None, Some(kind)) => format!("media.{}", default_extension(kind)),
        (None, None) => "media.bin".to_string(),
    };
    let tag = Uuid::new_v4().simple().to_string();
    dir.join(format!("{user}_{}_{name}", &tag[..8]))
}

/// Temp output for a video with its audio stripped.
pub fn no_audio_path(temp_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| sanitize(&s.to_string_lossy()))
        .unwrap_or_else(|| "video".to_string());
    temp_dir.join(format!("{}_{stem}_noaudio.mp4", Uuid::new_v4().simple()))
}

/// Fixed per-user merge output.
pub fn merge_output_path(dir: &Path, user: UserId, mode: MergeMode) -> PathBuf {
    match mode {
        MergeMode::Audio => dir.join(format!("merged_audio_{user}.mp3")),
        MergeMode::Video => dir.join(format!("merged_video_{user}.mp4")),
    }
}
