//! Bot handlers: `/remove_audio`, the merge session flow, and the dispatcher
//! that routes platform-neutral updates to them.

pub mod context;
pub mod dispatch;
pub mod merge;
pub mod naming;
pub mod port;
pub mod progress;
pub mod remove_audio;

#[cfg(test)]
mod testing;

pub use context::{BotContext, HandlerSettings};
pub use dispatch::{Deferred, Dispatcher, Inbound};
pub use merge::{MergeHandler, PendingInput};
pub use port::{ChatContext, ChatPort, IncomingMedia, MessageRef};
pub use progress::{format_transfer, StatusMessage};
pub use remove_audio::RemoveAudioHandler;
