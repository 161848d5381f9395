//! Media Event Logger
//!
//! Structured events for every external tool run and transform outcome,
//! emitted on the `media_events` target so they can be filtered into their
//! own stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum MediaEvent {
    ToolRun {
        program: String,
        args: Vec<String>,
        success: bool,
        elapsed_ms: u64,
    },
    TransformFailed {
        operation: String,
        error_msg: String,
    },
    CleanupFailed {
        path: String,
        error_msg: String,
    },
    MergeFinished {
        mode: String,
        outcome: String,
    },
}

#[derive(Debug, Serialize)]
pub struct MediaEventEntry {
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: MediaEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit a media event.
    pub fn log_event(job_id: &str, mut event: MediaEvent) {
        match &mut event {
            MediaEvent::ToolRun { args, .. } => {
                for arg in args.iter_mut() {
                    *arg = redact_sensitive_data(arg);
                }
            }
            MediaEvent::TransformFailed { error_msg, .. }
            | MediaEvent::CleanupFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            MediaEvent::MergeFinished { .. } => {}
        }

        let entry = MediaEventEntry {
            job_id: job_id.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(target: "media_events", event = %serde_json::to_string(&entry).unwrap_or_default(), "Media event");
    }
}
