/// Inbound dispatch: route bot commands and media messages to handlers.
///
/// Handlers return `BotError`; the dispatcher is the single place where an
/// error turns into an apology message, so a failing update never takes the
/// bot down.
use std::sync::Arc;

use ffbot_core::{BotError, MergeMode};
use tracing::{error, info, warn};

use crate::context::BotContext;
use crate::merge::{MergeHandler, PendingInput};
use crate::port::{ChatContext, IncomingMedia};
use crate::remove_audio::RemoveAudioHandler;

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// One update the bot reacts to, already stripped of platform types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start,
    Help,
    /// `/remove_audio`, with the attachment of the message it replied to.
    RemoveAudio { replied: Option<IncomingMedia> },
    MergeAudio,
    MergeVideo,
    /// Audio, video or document message outside any command.
    Media(IncomingMedia),
}

impl Inbound {
    fn name(&self) -> &'static str {
        match self {
            Inbound::Start => "/start",
            Inbound::Help => "/help",
            Inbound::RemoveAudio { .. } => "/remove_audio",
            Inbound::MergeAudio => "/merge_audio",
            Inbound::MergeVideo => "/merge_video",
            Inbound::Media(_) => "media",
        }
    }
}

/// The slow remainder of an update, safe to run off the chat's update queue.
#[derive(Debug, Clone)]
pub enum Deferred {
    RemoveAudio { replied: Option<IncomingMedia> },
    Download(PendingInput),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    ctx: Arc<BotContext>,
    remove_audio: RemoveAudioHandler,
    merge: MergeHandler,
    help_text: String,
}

impl Dispatcher {
    /// `help_text` is the command list shown by `/start` and `/help`.
    pub fn new(ctx: Arc<BotContext>, help_text: impl Into<String>) -> Self {
        Self {
            remove_audio: RemoveAudioHandler::new(Arc::clone(&ctx)),
            merge: MergeHandler::new(Arc::clone(&ctx)),
            help_text: help_text.into(),
            ctx,
        }
    }

    pub fn merge_handler(&self) -> &MergeHandler {
        &self.merge
    }

    /// Handle one update start to finish. Never fails: errors are logged and
    /// reported to the chat as `An error occurred: ...`.
    pub async fn dispatch(&self, chat: &ChatContext, inbound: Inbound) {
        if let Some(work) = self.admit(chat, inbound).await {
            self.complete(chat, work).await;
        }
    }

    /// Run the part of an update that must keep message order: commands that
    /// change session state and the slot reservation of a media message.
    /// Returns what is left to do.
    pub async fn admit(&self, chat: &ChatContext, inbound: Inbound) -> Option<Deferred> {
        info!("[Commands] Dispatching {} from user {}", inbound.name(), chat.user);
        let result = self.route(chat, inbound).await;
        self.report(chat, result).await.flatten()
    }

    /// Run deferred work, with the same error reporting as `dispatch`.
    pub async fn complete(&self, chat: &ChatContext, work: Deferred) {
        let result = match work {
            Deferred::RemoveAudio { replied } => {
                self.remove_audio.handle(chat, replied.as_ref()).await
            }
            Deferred::Download(input) => self.merge.finish(chat, input).await,
        };
        self.report(chat, result).await;
    }

    async fn report<T>(&self, chat: &ChatContext, result: Result<T, BotError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                if e.is_user_error() {
                    warn!(user = %chat.user, error = %e, "Request rejected");
                } else {
                    error!(user = %chat.user, error = %e, "Handler failed");
                }
                let text = format!("An error occurred: {e}");
                if let Err(send_err) = self.ctx.port.reply(chat, &text).await {
                    error!(user = %chat.user, error = %send_err, "Could not report handler failure");
                }
                None
            }
        }
    }

    async fn route(&self, chat: &ChatContext, inbound: Inbound) -> Result<Option<Deferred>, BotError> {
        match inbound {
            Inbound::Start => {
                let text = format!(
                    "Hi! I can strip the audio from your videos and merge media files.\n\n{}",
                    self.help_text
                );
                self.ctx.port.reply(chat, &text).await?;
            }
            Inbound::Help => {
                self.ctx.port.reply(chat, &self.help_text).await?;
            }
            Inbound::RemoveAudio { replied } => return Ok(Some(Deferred::RemoveAudio { replied })),
            Inbound::MergeAudio => self.merge.begin(chat, MergeMode::Audio).await?,
            Inbound::MergeVideo => self.merge.begin(chat, MergeMode::Video).await?,
            Inbound::Media(media) => {
                return Ok(self.merge.accept(chat, &media).await?.map(Deferred::Download));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::NO_SESSION_HINT;
    use crate::testing::{harness, FakePort, Harness};
    use ffbot_core::{MediaKind, SessionState};
    use ffbot_media::testing::FakeRunner;

    const HELP: &str = "/remove_audio - strip audio";

    fn video() -> IncomingMedia {
        IncomingMedia {
            file_id: "v".into(),
            file_name: Some("v.mp4".into()),
            file_size: 100,
            mime_type: Some("video/mp4".into()),
            kind: Some(MediaKind::Video),
        }
    }

    #[tokio::test]
    async fn help_and_start_show_command_list() {
        let Harness { ctx, port, _dirs, .. } = harness(FakeRunner::new(), FakePort::new());
        let dispatcher = Dispatcher::new(ctx, HELP);
        dispatcher.dispatch(&port.chat(), Inbound::Help).await;
        dispatcher.dispatch(&port.chat(), Inbound::Start).await;
        let replies = port.replies();
        assert_eq!(replies[0], HELP);
        assert!(replies[1].starts_with("Hi!"));
        assert!(replies[1].ends_with(HELP));
    }

    #[tokio::test]
    async fn merge_command_then_media_reaches_session() {
        let Harness { ctx, port, _dirs, .. } = harness(FakeRunner::new(), FakePort::new());
        let sessions = Arc::clone(&ctx.sessions);
        let dispatcher = Dispatcher::new(ctx, HELP);
        let chat = port.chat();

        dispatcher.dispatch(&chat, Inbound::Media(video())).await;
        assert_eq!(port.replies(), vec![NO_SESSION_HINT.to_string()]);

        dispatcher.dispatch(&chat, Inbound::MergeVideo).await;
        dispatcher.dispatch(&chat, Inbound::Media(video())).await;
        assert_eq!(sessions.state(chat.user).await, Some(SessionState::AwaitingSecond));
    }

    #[tokio::test]
    async fn admit_reserves_in_order_and_defers_the_download() {
        let Harness { ctx, port, _dirs, .. } = harness(FakeRunner::new(), FakePort::new());
        let sessions = Arc::clone(&ctx.sessions);
        let dispatcher = Dispatcher::new(ctx, HELP);
        let chat = port.chat();

        assert!(dispatcher.admit(&chat, Inbound::MergeVideo).await.is_none());
        let work = dispatcher.admit(&chat, Inbound::Media(video())).await;
        assert!(matches!(work, Some(Deferred::Download(_))));
        assert!(port.downloads().is_empty());

        // The reserved slot already counts: a second video is refused.
        assert!(dispatcher.admit(&chat, Inbound::Media(video())).await.is_none());
        assert!(port.replies().iter().any(|r| r.contains("expects a audio file")));

        dispatcher.complete(&chat, work.unwrap()).await;
        assert_eq!(port.downloads(), vec!["v"]);
        assert_eq!(sessions.state(chat.user).await, Some(SessionState::AwaitingSecond));
    }

    #[tokio::test]
    async fn remove_audio_runs_as_deferred_work() {
        let Harness { ctx, port, _dirs, .. } = harness(FakeRunner::new(), FakePort::new());
        let dispatcher = Dispatcher::new(ctx, HELP);
        let chat = port.chat();

        let work = dispatcher
            .admit(&chat, Inbound::RemoveAudio { replied: None })
            .await
            .unwrap();
        assert!(port.replies().is_empty());
        dispatcher.complete(&chat, work).await;
        assert_eq!(port.replies().len(), 1);
    }

    #[tokio::test]
    async fn handler_errors_become_apology_messages() {
        let Harness { ctx, port, _dirs, .. } =
            harness(FakeRunner::new(), FakePort::new().failing_uploads());
        let dispatcher = Dispatcher::new(ctx, HELP);

        dispatcher
            .dispatch(&port.chat(), Inbound::RemoveAudio { replied: Some(video()) })
            .await;

        let last = port.replies().pop().unwrap();
        assert!(last.starts_with("An error occurred: "), "{last}");
    }
}
