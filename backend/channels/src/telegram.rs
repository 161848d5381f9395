use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ffbot_commands::{
    ChatContext, ChatPort, Dispatcher as HandlerDispatcher, Inbound, IncomingMedia, MessageRef,
};
use ffbot_core::{ProgressObserver, UserId};
use teloxide::dispatching::UpdateHandler;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::telegram_commands::Command;
use crate::telegram_media::{merge_input, replied_video, TelegramMedia};
use crate::ChannelAdapter;

/// Build the bot client, optionally against a self-hosted Bot API server
/// (needed for files over 20 MB).
pub fn build_bot(token: &str, api_url: Option<&str>) -> anyhow::Result<Bot> {
    let bot = Bot::new(token);
    Ok(match api_url {
        Some(url) => bot.set_api_url(url.parse::<reqwest::Url>()?),
        None => bot,
    })
}

// ---------------------------------------------------------------------------
// ChatPort over the Bot API
// ---------------------------------------------------------------------------

pub struct TelegramPort {
    bot: Bot,
}

impl TelegramPort {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatPort for TelegramPort {
    async fn reply(&self, chat: &ChatContext, text: &str) -> anyhow::Result<MessageRef> {
        let sent = self
            .bot
            .send_message(ChatId(chat.chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(chat.message_id)))
            .await?;
        Ok(MessageRef {
            chat_id: chat.chat_id,
            message_id: sent.id.0,
        })
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> anyhow::Result<()> {
        self.bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> anyhow::Result<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await?;
        Ok(())
    }

    async fn download(
        &self,
        media: &IncomingMedia,
        dest: &Path,
        progress: &dyn ProgressObserver,
    ) -> anyhow::Result<()> {
        TelegramMedia::download(&self.bot, media, dest, progress).await
    }

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> anyhow::Result<()> {
        TelegramMedia::send_video(&self.bot, chat_id, path, caption, progress).await
    }

    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        progress: &dyn ProgressObserver,
    ) -> anyhow::Result<()> {
        TelegramMedia::send_document(&self.bot, chat_id, path, caption, progress).await
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

pub struct TelegramAdapter {
    bot: Bot,
    handlers: Arc<HandlerDispatcher>,
    /// Idle merge sessions older than this are purged. `None` keeps them.
    session_ttl: Option<Duration>,
}

impl TelegramAdapter {
    pub fn new(bot: Bot, handlers: Arc<HandlerDispatcher>, session_ttl: Option<Duration>) -> Self {
        Self {
            bot,
            handlers,
            session_ttl,
        }
    }

    fn schema() -> UpdateHandler<anyhow::Error> {
        let commands = teloxide::filter_command::<Command, _>().endpoint(on_command);
        let media = dptree::filter_map(|msg: Message| merge_input(&msg)).endpoint(on_media);

        Update::filter_message().branch(commands).branch(media)
    }

    fn spawn_session_janitor(&self) {
        let Some(ttl) = self.session_ttl else {
            return;
        };
        let handlers = Arc::clone(&self.handlers);
        let period = ttl.min(Duration::from_secs(60));
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                handlers.merge_handler().purge_stale(ttl).await;
            }
        });
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!("Starting Telegram adapter");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Could not register bot commands: {}", e);
        }
        self.spawn_session_janitor();

        Dispatcher::builder(self.bot.clone(), Self::schema())
            .dependencies(dptree::deps![Arc::clone(&self.handlers)])
            .default_handler(|_| async {})
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error from the update listener",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}

fn chat_context(msg: &Message) -> Option<ChatContext> {
    let user = msg.from.as_ref()?;
    Some(ChatContext {
        chat_id: msg.chat.id.0,
        user: UserId(user.id.0),
        message_id: msg.id.0,
    })
}

/// Teloxide hands one chat's updates over one at a time, so the in-order part
/// of an update runs here. Downloads and transforms are detached so they do
/// not hold up the chat's queue.
async fn dispatch_update(handlers: Arc<HandlerDispatcher>, chat: ChatContext, inbound: Inbound) {
    if let Some(work) = handlers.admit(&chat, inbound).await {
        tokio::spawn(async move {
            handlers.complete(&chat, work).await;
        });
    }
}

async fn on_command(
    msg: Message,
    cmd: Command,
    handlers: Arc<HandlerDispatcher>,
) -> anyhow::Result<()> {
    let Some(chat) = chat_context(&msg) else {
        error!("Command without sender in chat {}", msg.chat.id);
        return Ok(());
    };
    info!("Received {:?} from Telegram chat {}", cmd, msg.chat.id);
    let inbound = cmd.into_inbound(replied_video(&msg));
    dispatch_update(handlers, chat, inbound).await;
    Ok(())
}

async fn on_media(
    msg: Message,
    media: IncomingMedia,
    handlers: Arc<HandlerDispatcher>,
) -> anyhow::Result<()> {
    let Some(chat) = chat_context(&msg) else {
        return Ok(());
    };
    dispatch_update(handlers, chat, Inbound::Media(media)).await;
    Ok(())
}
