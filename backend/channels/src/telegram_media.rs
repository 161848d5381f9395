//! Telegram media handling
//!
//! Turns audio, video and document messages into `IncomingMedia`, streams
//! downloads to disk with progress, and uploads results.

use std::path::Path;

use anyhow::Result;
use ffbot_commands::IncomingMedia;
use ffbot_core::{MediaKind, ProgressObserver};
use ffbot_media::{kind_from_mime, kind_from_path};
use futures::StreamExt;
use teloxide::net::Download;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Classify a document by MIME type, falling back to its file name.
pub fn document_kind(mime: Option<&str>, file_name: Option<&str>) -> Option<MediaKind> {
    mime.and_then(kind_from_mime)
        .or_else(|| file_name.and_then(|n| kind_from_path(Path::new(n))))
}

/// Audio, video or document attached to `msg`.
pub fn attachment(msg: &Message) -> Option<IncomingMedia> {
    if let Some(video) = msg.video() {
        return Some(IncomingMedia {
            file_id: video.file.id.0.clone(),
            file_name: video.file_name.clone(),
            file_size: u64::from(video.file.size),
            mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
            kind: Some(MediaKind::Video),
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(IncomingMedia {
            file_id: audio.file.id.0.clone(),
            file_name: audio.file_name.clone(),
            file_size: u64::from(audio.file.size),
            mime_type: audio.mime_type.as_ref().map(|m| m.to_string()),
            kind: Some(MediaKind::Audio),
        });
    }
    let doc = msg.document()?;
    let mime_type = doc.mime_type.as_ref().map(|m| m.to_string());
    Some(IncomingMedia {
        file_id: doc.file.id.0.clone(),
        kind: document_kind(mime_type.as_deref(), doc.file_name.as_deref()),
        file_name: doc.file_name.clone(),
        file_size: u64::from(doc.file.size),
        mime_type,
    })
}

/// Audio or video message that feeds a merge session. Forwarded messages and
/// documents that are neither are left alone.
pub fn merge_input(msg: &Message) -> Option<IncomingMedia> {
    if msg.forward_origin().is_some() {
        return None;
    }
    attachment(msg).filter(|media| media.kind.is_some())
}

/// Video or document in the message `msg` replies to.
pub fn replied_video(msg: &Message) -> Option<IncomingMedia> {
    let replied = msg.reply_to_message()?;
    if replied.audio().is_some() {
        return None;
    }
    attachment(replied)
}

pub struct TelegramMedia;

impl TelegramMedia {
    /// Stream the file behind `media` into `dest`.
    pub async fn download(
        bot: &Bot,
        media: &IncomingMedia,
        dest: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        info!("Downloading Telegram file {} to {}", media.file_id, dest.display());
        let file = bot.get_file(FileId(media.file_id.clone())).await?;

        let mut out = tokio::fs::File::create(dest).await?;
        let mut stream = bot.download_file_stream(&file.path);
        let mut done = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            done += chunk.len() as u64;
            progress.transfer("Downloading...", done, media.file_size).await;
        }
        out.flush().await?;
        Ok(())
    }

    /// The Bot API reports no upload progress; `progress` only hears about
    /// the finished transfer.
    pub async fn send_video(
        bot: &Bot,
        chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        info!("Uploading video {} to chat_id: {}", path.display(), chat_id);
        let size = file_size(path).await;
        bot.send_video(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption)
            .supports_streaming(true)
            .await?;
        progress.transfer("Uploading...", size, size).await;
        Ok(())
    }

    pub async fn send_document(
        bot: &Bot,
        chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> Result<()> {
        info!("Uploading document {} to chat_id: {}", path.display(), chat_id);
        let size = file_size(path).await;
        bot.send_document(ChatId(chat_id), InputFile::file(path.to_path_buf()))
            .caption(caption)
            .await?;
        progress.transfer("Uploading...", size, size).await;
        Ok(())
    }
}

async fn file_size(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(extra: serde_json::Value) -> Message {
        let mut base = json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": { "id": 5, "type": "private", "first_name": "Ann" },
            "from": { "id": 42, "is_bot": false, "first_name": "Ann" }
        });
        if let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) {
            obj.extend(more.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    fn video_json() -> serde_json::Value {
        json!({
            "file_id": "vid-1",
            "file_unique_id": "u1",
            "width": 640,
            "height": 360,
            "duration": 12,
            "file_name": "clip.mp4",
            "mime_type": "video/mp4",
            "file_size": 4096
        })
    }

    #[test]
    fn document_kind_prefers_mime() {
        assert_eq!(document_kind(Some("audio/ogg"), Some("x.mp4")), Some(MediaKind::Audio));
        assert_eq!(document_kind(None, Some("x.mkv")), Some(MediaKind::Video));
        assert_eq!(document_kind(Some("application/pdf"), Some("doc.pdf")), None);
    }

    #[test]
    fn video_message_becomes_video_media() {
        let msg = message(json!({ "video": video_json() }));
        let media = attachment(&msg).unwrap();
        assert_eq!(media.file_id, "vid-1");
        assert_eq!(media.file_size, 4096);
        assert_eq!(media.kind, Some(MediaKind::Video));
        assert_eq!(media.file_name.as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn audio_document_is_classified() {
        let msg = message(json!({
            "document": {
                "file_id": "doc-1",
                "file_unique_id": "u2",
                "file_name": "voice.flac",
                "file_size": 10
            }
        }));
        assert_eq!(attachment(&msg).unwrap().kind, Some(MediaKind::Audio));
    }

    #[test]
    fn text_message_has_no_attachment() {
        let msg = message(json!({ "text": "hello" }));
        assert!(attachment(&msg).is_none());
    }

    #[test]
    fn forwarded_media_is_not_a_merge_input() {
        let msg = message(json!({
            "video": video_json(),
            "forward_origin": {
                "type": "hidden_user",
                "date": 1_699_999_000,
                "sender_user_name": "Someone"
            }
        }));
        assert!(attachment(&msg).is_some());
        assert!(merge_input(&msg).is_none());
    }

    #[test]
    fn non_media_document_is_not_a_merge_input() {
        let msg = message(json!({
            "document": {
                "file_id": "doc-2",
                "file_unique_id": "u3",
                "file_name": "doc.pdf",
                "mime_type": "application/pdf",
                "file_size": 10
            }
        }));
        assert_eq!(attachment(&msg).unwrap().kind, None);
        assert!(merge_input(&msg).is_none());
    }

    #[test]
    fn audio_message_is_a_merge_input() {
        let msg = message(json!({
            "audio": {
                "file_id": "aud-1",
                "file_unique_id": "u4",
                "duration": 3,
                "mime_type": "audio/mpeg",
                "file_size": 10
            }
        }));
        assert_eq!(merge_input(&msg).unwrap().kind, Some(MediaKind::Audio));
    }
}
