//! Config defaults: fills unset fields so the prepared config is explicit.

use std::collections::HashMap;

use crate::schema::{BotConfig, LimitsConfig, LoggingConfig, PathsConfig, TelegramConfig, ToolsConfig};

/// Environment variable consulted when `telegram.token` is unset.
pub const TOKEN_ENV_VAR: &str = "TELOXIDE_TOKEN";

pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_FFPROBE: &str = "ffprobe";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;
pub const DEFAULT_WORKER_THREADS: usize = 4;
pub const DEFAULT_SCREENSHOT_OFFSET_SECS: f64 = 5.0;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults. `env` supplies the `TELOXIDE_TOKEN` fallback.
pub fn apply_all_defaults_with(config: BotConfig, env: &HashMap<String, String>) -> BotConfig {
    let config = apply_telegram_defaults(config, env);
    let config = apply_path_defaults(config);
    let config = apply_tool_defaults(config);
    let config = apply_limit_defaults(config);
    apply_logging_defaults(config)
}

/// Take the token from `TELOXIDE_TOKEN` when the file has none.
fn apply_telegram_defaults(mut config: BotConfig, env: &HashMap<String, String>) -> BotConfig {
    let telegram = config.telegram.get_or_insert_with(TelegramConfig::default);
    if telegram.token.as_deref().map(str::is_empty).unwrap_or(true) {
        telegram.token = env.get(TOKEN_ENV_VAR).filter(|t| !t.is_empty()).cloned();
    }
    config
}

fn apply_path_defaults(mut config: BotConfig) -> BotConfig {
    let paths = config.paths.get_or_insert_with(PathsConfig::default);
    if paths.downloads_dir.is_none() {
        paths.downloads_dir = Some(DEFAULT_DOWNLOADS_DIR.into());
    }
    if paths.temp_dir.is_none() {
        paths.temp_dir = Some(std::env::temp_dir());
    }
    config
}

fn apply_tool_defaults(mut config: BotConfig) -> BotConfig {
    let tools = config.tools.get_or_insert_with(ToolsConfig::default);
    tools.ffmpeg.get_or_insert_with(|| DEFAULT_FFMPEG.to_string());
    tools.ffprobe.get_or_insert_with(|| DEFAULT_FFPROBE.to_string());
    config
}

fn apply_limit_defaults(mut config: BotConfig) -> BotConfig {
    let limits = config.limits.get_or_insert_with(LimitsConfig::default);
    limits.max_file_size_bytes.get_or_insert(DEFAULT_MAX_FILE_SIZE);
    limits.worker_threads.get_or_insert(DEFAULT_WORKER_THREADS);
    limits.screenshot_offset_secs.get_or_insert(DEFAULT_SCREENSHOT_OFFSET_SECS);
    limits.session_ttl_secs.get_or_insert(0);
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.into());
    config
}
