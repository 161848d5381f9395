//! Telegram bot commands
//!
//! Parses `/start`, `/help`, `/remove_audio`, `/merge_audio` and
//! `/merge_video` and maps them onto handler events.

use ffbot_commands::{IncomingMedia, Inbound};
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message.")]
    Start,
    #[command(description = "show this help.")]
    Help,
    #[command(description = "reply to a video or document to strip its audio track.")]
    RemoveAudio,
    #[command(description = "concatenate two audio files.")]
    MergeAudio,
    #[command(description = "combine a video with an audio track.")]
    MergeVideo,
}

impl Command {
    /// `replied` is the attachment of the message the command answered, if any.
    pub fn into_inbound(self, replied: Option<IncomingMedia>) -> Inbound {
        match self {
            Command::Start => Inbound::Start,
            Command::Help => Inbound::Help,
            Command::RemoveAudio => Inbound::RemoveAudio { replied },
            Command::MergeAudio => Inbound::MergeAudio,
            Command::MergeVideo => Inbound::MergeVideo,
        }
    }
}

/// Command list shown by `/start` and `/help`.
pub fn help_text() -> String {
    Command::descriptions().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_commands() {
        assert_eq!(Command::parse("/remove_audio", "ffbot").unwrap(), Command::RemoveAudio);
        assert_eq!(Command::parse("/merge_audio", "ffbot").unwrap(), Command::MergeAudio);
        assert_eq!(Command::parse("/merge_video@ffbot", "ffbot").unwrap(), Command::MergeVideo);
        assert!(Command::parse("/mergeaudio", "ffbot").is_err());
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for name in ["/start", "/help", "/remove_audio", "/merge_audio", "/merge_video"] {
            assert!(help.contains(name), "missing {name} in {help}");
        }
    }

    #[test]
    fn remove_audio_carries_reply() {
        let media = IncomingMedia {
            file_id: "f".into(),
            file_name: None,
            file_size: 1,
            mime_type: None,
            kind: None,
        };
        assert_eq!(
            Command::RemoveAudio.into_inbound(Some(media.clone())),
            Inbound::RemoveAudio { replied: Some(media) }
        );
        assert_eq!(Command::MergeAudio.into_inbound(None), Inbound::MergeAudio);
    }
}
