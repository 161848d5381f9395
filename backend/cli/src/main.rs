mod config;
mod doctor_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ffbot_channels::{build_bot, help_text, ChannelAdapter, TelegramAdapter, TelegramPort};
use ffbot_commands::{BotContext, Dispatcher, HandlerSettings};
use ffbot_config::{redact, validate, BotConfig};
use ffbot_core::{BotError, SessionStore};
use ffbot_media::{FfmpegCommands, MediaToolkit, ProcessRunner, WorkerPool};

use terminal_output::{note_error, note_warn};

#[derive(Parser)]
#[command(name = "ffbot")]
#[command(about = "Telegram bot that strips audio from videos and merges media with ffmpeg")]
#[command(version)]
struct Cli {
    /// Config file (default: $FFBOT_CONFIG_DIR/config.yaml or ~/.ffbot/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Check that ffmpeg and ffprobe can be executed
    CheckTools,
    /// Print the effective configuration with secrets masked
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let (path, config) = config::load(cli.config.as_deref()).await?;
            ffbot_logging::init_logger(config.log_dir(), config.log_level());
            info!(path = %path.display(), "Configuration loaded");
            run_bot(config).await?;
        }
        Commands::CheckTools => {
            init_cli_logging();
            let (_, config) = config::load(cli.config.as_deref()).await?;
            doctor_cmd::run(&ProcessRunner::new(), &media_commands(&config)).await?;
        }
        Commands::ShowConfig => {
            init_cli_logging();
            let (path, config) = config::load(cli.config.as_deref()).await?;
            show_config(&path, &config)?;
        }
    }

    Ok(())
}

/// Diagnostics print to stdout; keep log lines on stderr and quiet.
fn init_cli_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn media_commands(config: &BotConfig) -> FfmpegCommands {
    FfmpegCommands::new(config.ffmpeg(), config.ffprobe())
}

fn show_config(path: &std::path::Path, config: &BotConfig) -> Result<()> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    println!("# {}", path.display());
    print!("{}", serde_yaml::to_string(&redact(&value))?);

    let report = validate(config);
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    Ok(())
}

async fn run_bot(config: BotConfig) -> Result<()> {
    // Config was loaded before the logger existed; repeat its warnings.
    let report = validate(&config);
    for warning in &report.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        let reasons: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        return Err(BotError::Config(reasons.join("; ")).into());
    }
    let token = config.token().context("telegram.token is not set")?;

    info!(
        workers = config.worker_threads(),
        downloads = %config.downloads_dir().display(),
        temp = %config.temp_dir().display(),
        "Starting ffbot"
    );

    let bot = build_bot(token, config.api_url())?;
    let toolkit = MediaToolkit::new(
        Arc::new(ProcessRunner::new()),
        media_commands(&config),
        WorkerPool::new(config.worker_threads()),
    );
    let settings = HandlerSettings {
        downloads_dir: config.downloads_dir(),
        temp_dir: config.temp_dir(),
        max_file_size: config.max_file_size(),
        screenshot_offset_secs: config.screenshot_offset_secs(),
    };
    let ctx = BotContext::new(
        Arc::new(TelegramPort::new(bot.clone())),
        Arc::new(toolkit),
        Arc::new(SessionStore::new()),
        settings,
    );
    ctx.prepare_dirs()
        .await
        .context("Failed to create downloads/temp directories")?;

    let handlers = Arc::new(Dispatcher::new(Arc::new(ctx), help_text()));
    let adapter = TelegramAdapter::new(bot, handlers, config.session_ttl());
    info!(adapter = adapter.name(), "Bot is running");
    adapter.start().await
}
