//! Media kind detection for incoming attachments.
//!
//! Telegram tags audio and video messages itself; documents only carry a
//! MIME type and a file name, so those are classified here.

use std::path::Path;

use ffbot_core::MediaKind;

/// Classify a MIME type.
pub fn kind_from_mime(mime: &str) -> Option<MediaKind> {
    let mime = mime.trim().to_ascii_lowercase();
    if mime.starts_with("audio/") {
        Some(MediaKind::Audio)
    } else if mime.starts_with("video/") {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Classify a file by extension.
pub fn kind_from_path(path: &Path) -> Option<MediaKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "mp3" | "ogg" | "oga" | "wav" | "flac" | "m4a" | "opus" | "aac" => Some(MediaKind::Audio),
        "mp4" | "webm" | "mkv" | "mov" | "avi" | "ogv" | "m4v" => Some(MediaKind::Video),
        _ => None,
    }
}

/// Extension used when an attachment arrives without a file name.
pub fn default_extension(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "mp3",
        MediaKind::Video => "mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn mime_classification() {
        assert_eq!(kind_from_mime("audio/mpeg"), Some(MediaKind::Audio));
        assert_eq!(kind_from_mime("Video/MP4"), Some(MediaKind::Video));
        assert_eq!(kind_from_mime("application/pdf"), None);
    }

    #[test]
    fn extension_classification() {
        assert_eq!(kind_from_path(&PathBuf::from("song.FLAC")), Some(MediaKind::Audio));
        assert_eq!(kind_from_path(&PathBuf::from("clip.mkv")), Some(MediaKind::Video));
        assert_eq!(kind_from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(kind_from_path(&PathBuf::from("noext")), None);
    }
}
