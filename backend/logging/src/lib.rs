//! Structured logging for ffbot.
//!
//! Console + rolling NDJSON output, secret redaction, and media job events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, MediaEvent, MediaEventEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
