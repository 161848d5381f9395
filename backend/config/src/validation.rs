//! Config validation: checks with user-friendly error messages.

use crate::schema::BotConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_telegram(config, &mut report);
    validate_tools(config, &mut report);
    validate_limits(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_telegram(config: &BotConfig, report: &mut ValidationReport) {
    if config.token().is_none() {
        report.error(
            "telegram.token",
            "Telegram bot token is required (or set TELOXIDE_TOKEN)",
        );
    }
    if let Some(url) = config.api_url() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("telegram.apiUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
}

fn validate_tools(config: &BotConfig, report: &mut ValidationReport) {
    if config.ffmpeg().trim().is_empty() {
        report.error("tools.ffmpeg", "ffmpeg program cannot be empty");
    }
    if config.ffprobe().trim().is_empty() {
        report.error("tools.ffprobe", "ffprobe program cannot be empty");
    }
}

fn validate_limits(config: &BotConfig, report: &mut ValidationReport) {
    if config.worker_threads() == 0 {
        report.error("limits.workerThreads", "workerThreads must be >= 1");
    } else if config.worker_threads() > 64 {
        report.warn(
            "limits.workerThreads",
            "More than 64 concurrent ffmpeg processes will likely thrash the host",
        );
    }

    let max = config.max_file_size();
    if max == 0 {
        report.error("limits.maxFileSizeBytes", "maxFileSizeBytes must be > 0");
    } else if config.api_url().is_none() && max > 20 * 1024 * 1024 {
        report.warn(
            "limits.maxFileSizeBytes",
            "The public Bot API only serves files up to 20 MB; set telegram.apiUrl to a local Bot API server for larger files",
        );
    }

    let offset = config.screenshot_offset_secs();
    if !offset.is_finite() || offset < 0.0 {
        report.error(
            "limits.screenshotOffsetSecs",
            "screenshotOffsetSecs must be a non-negative number",
        );
    }
}

fn validate_logging(config: &BotConfig, report: &mut ValidationReport) {
    let level = config.log_level();
    if !matches!(
        level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        report.warn(
            "logging.level",
            format!("Unknown log level '{level}'; RUST_LOG-style directives are passed through as-is"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LimitsConfig, TelegramConfig};

    fn with_token() -> BotConfig {
        BotConfig {
            telegram: Some(TelegramConfig {
                token: Some("123:abc".into()),
                api_url: Some("http://localhost:8081".into()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn token_only_config_is_valid() {
        let report = validate(&with_token());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn missing_token_is_error() {
        let report = validate(&BotConfig::default());
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "telegram.token");
    }

    #[test]
    fn zero_workers_and_size_are_errors() {
        let mut cfg = with_token();
        cfg.limits = Some(LimitsConfig {
            worker_threads: Some(0),
            max_file_size_bytes: Some(0),
            ..Default::default()
        });
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["limits.workerThreads", "limits.maxFileSizeBytes"]);
    }

    #[test]
    fn public_api_with_large_limit_warns() {
        let mut cfg = with_token();
        if let Some(tg) = cfg.telegram.as_mut() {
            tg.api_url = None;
        }
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.path == "limits.maxFileSizeBytes"));
    }
}
