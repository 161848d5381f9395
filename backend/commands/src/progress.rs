//! Status-message progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ffbot_core::ProgressObserver;
use tracing::debug;

use crate::port::{ChatPort, MessageRef};

const NO_STEP: u64 = u64::MAX;

/// Percent granularity of transfer updates.
const STEP_PERCENT: u64 = 10;

/// Reports progress by editing one status message.
///
/// Transfer updates are throttled to `STEP_PERCENT` steps to stay clear of
/// the platform's edit rate limits.
pub struct StatusMessage<'a> {
    port: &'a dyn ChatPort,
    message: MessageRef,
    last_step: AtomicU64,
}

impl<'a> StatusMessage<'a> {
    pub fn new(port: &'a dyn ChatPort, message: MessageRef) -> Self {
        Self {
            port,
            message,
            last_step: AtomicU64::new(NO_STEP),
        }
    }

    pub async fn delete(&self) {
        if let Err(e) = self.port.delete_message(self.message).await {
            debug!(error = %e, "Could not delete status message");
        }
    }
}

#[async_trait]
impl ProgressObserver for StatusMessage<'_> {
    async fn status(&self, text: &str) {
        self.last_step.store(NO_STEP, Ordering::SeqCst);
        if let Err(e) = self.port.edit_text(self.message, text).await {
            debug!(error = %e, "Could not edit status message");
        }
    }

    async fn transfer(&self, label: &str, done: u64, total: u64) {
        let step = if total == 0 {
            // Unknown size: one update per 5 MiB.
            done / (5 * 1024 * 1024)
        } else {
            done.min(total) * 100 / total / STEP_PERCENT
        };
        if self.last_step.swap(step, Ordering::SeqCst) == step {
            return;
        }
        let text = format_transfer(label, done, total);
        if let Err(e) = self.port.edit_text(self.message, &text).await {
            debug!(error = %e, "Could not edit status message");
        }
    }
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// `Downloading video... 40% (2.00 MB of 5.00 MB)`
pub fn format_transfer(label: &str, done: u64, total: u64) -> String {
    if total == 0 {
        return format!("{label} {:.2} MB", mb(done));
    }
    let percent = done.min(total) * 100 / total;
    format!("{label} {percent}% ({:.2} MB of {:.2} MB)", mb(done), mb(total))
}
