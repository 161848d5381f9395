//! `ffbot-config` — bot runtime configuration.
//!
//! Provides:
//! - Typed config schema (telegram, paths, tools, limits, logging)
//! - YAML loading from `~/.ffbot/config.yaml` or `$FFBOT_CONFIG_DIR`
//! - `${ENV_VAR}` substitution
//! - Default value application, including the `TELOXIDE_TOKEN` fallback
//! - Validation and redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::{apply_all_defaults_with, TOKEN_ENV_VAR};
pub use env::{resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use redact::redact;
pub use schema::BotConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load, apply env substitution and defaults, and validate a config file.
///
/// Validation problems are logged; callers that need a runnable config check
/// `validate(&config).is_valid()` themselves.
pub async fn load_and_prepare(path: &Path) -> Result<BotConfig> {
    load_and_prepare_with(path, &std::env::vars().collect()).await
}

/// Same as `load_and_prepare` with an explicit environment.
pub async fn load_and_prepare_with(path: &Path, env: &HashMap<String, String>) -> Result<BotConfig> {
    let value = load_config(path).await?;

    // Substitute ${VAR} env vars.
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: BotConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults_with(config, env);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepares_file_with_env_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(
            &path,
            "telegram:\n  token: ${FFBOT_TEST_TOKEN}\nlimits:\n  workerThreads: 2\n",
        )
        .await
        .unwrap();

        let env: HashMap<String, String> =
            [("FFBOT_TEST_TOKEN".to_string(), "42:secret".to_string())].into();
        let cfg = load_and_prepare_with(&path, &env).await.unwrap();

        assert_eq!(cfg.token(), Some("42:secret"));
        assert_eq!(cfg.worker_threads(), 2);
        assert_eq!(cfg.ffmpeg(), "ffmpeg");
        assert!(validate(&cfg).is_valid());
    }

    #[tokio::test]
    async fn missing_file_uses_env_token() {
        let dir = tempfile::tempdir().unwrap();
        let env: HashMap<String, String> =
            [(TOKEN_ENV_VAR.to_string(), "7:abc".to_string())].into();
        let cfg = load_and_prepare_with(&dir.path().join("none.yaml"), &env)
            .await
            .unwrap();
        assert_eq!(cfg.token(), Some("7:abc"));
        assert_eq!(cfg.downloads_dir(), std::path::PathBuf::from("downloads"));
    }

    #[tokio::test]
    async fn unresolved_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "telegram:\n  token: ${NOPE_NOT_SET}\n").await.unwrap();
        assert!(load_and_prepare_with(&path, &HashMap::new()).await.is_err());
    }
}
