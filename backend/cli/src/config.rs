use std::path::{Path, PathBuf};

use anyhow::Result;
use ffbot_config::{config_dir, config_file_path, load_and_prepare, BotConfig};

/// `--config` wins; otherwise `$FFBOT_CONFIG_DIR/config.yaml` or `~/.ffbot/config.yaml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path(&config_dir()),
    }
}

pub async fn load(explicit: Option<&Path>) -> Result<(PathBuf, BotConfig)> {
    let path = resolve_config_path(explicit);
    let config = load_and_prepare(&path).await?;
    Ok((path, config))
}
