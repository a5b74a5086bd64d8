//! Review Notifier - Main Entry Point
//!
//! Loads configuration, wires the review API client and the Telegram bot into
//! the relay loop, and runs it until SIGINT or SIGTERM.

use clap::{Parser, Subcommand};
use review_notifier::config::NotifierConfig;
use review_notifier::error::{NotifierError, NotifierResult};
use review_notifier::observability::{
    chat_log_channel, init_default_logging, ChatLogForwarder, ChatLogHandle, ChatLogLayer,
};
use review_notifier::relay::{Relay, RelaySettings};
use review_notifier::review::{ReviewApiClient, ReviewApiConfig};
use review_notifier::telegram::{TelegramBot, TelegramConfig};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::{signal, time::Duration};
use tracing::{error, info, warn};

const CHAT_LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards code review results to a Telegram chat
#[derive(Parser)]
#[command(name = "review-notifier")]
#[command(about = "Long-polling relay for code review notifications")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for review results and forward them (default)
    Run,
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

/// Everything `run` needs, built before logging starts
struct Notifier {
    relay: Relay,
    chat_log: Option<(ChatLogLayer, ChatLogHandle, ChatLogForwarder)>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Real environment wins over .env
    dotenvy::dotenv().ok();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => fail_before_logging(cli.verbose, "Failed to load configuration", e),
    };

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => match build_notifier(&config) {
            Ok(notifier) => run_notifier(notifier, cli.verbose).await,
            Err(e) => fail_before_logging(cli.verbose, "Failed to start notifier", e),
        },
        Commands::Config { show } => {
            init_default_logging(cli.verbose, None);
            handle_config_command(&config, show)
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn fail_before_logging(verbosity: u8, context: &str, e: NotifierError) -> ! {
    init_default_logging(verbosity, None);
    error!("{}: {}", context, e);
    process::exit(1);
}

fn load_configuration(config_path: &Option<PathBuf>) -> NotifierResult<NotifierConfig> {
    match config_path {
        Some(path) => Ok(NotifierConfig::load_from_file(path)?),
        None => {
            let default_paths = ["notifier.toml", "config/notifier.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    return Ok(NotifierConfig::load_from_file(&path)?);
                }
            }

            Ok(NotifierConfig::default())
        }
    }
}

/// Resolve secrets and construct the clients. No network traffic happens here.
fn build_notifier(config: &NotifierConfig) -> NotifierResult<Notifier> {
    let chat_id = config.get_chat_id()?;

    let bot = Arc::new(TelegramBot::new(TelegramConfig {
        bot_token: config.get_bot_token()?,
        api_url: config.telegram.api_url.clone(),
        timeout: config.telegram_request_timeout(),
    })?);

    let source = Arc::new(ReviewApiClient::new(ReviewApiConfig {
        url: config.review_api.url.clone(),
        token: config.get_review_api_token()?,
        timeout: config.review_request_timeout(),
    })?);

    let chat_log = config.telegram.forward_logs.then(|| {
        chat_log_channel(bot.clone(), chat_id.clone(), config.chat_log_level())
    });

    let relay = Relay::new(
        source,
        bot,
        RelaySettings {
            chat_id,
            connection_retry_delay: config.connection_retry_delay(),
        },
    );

    Ok(Notifier { relay, chat_log })
}

async fn run_notifier(notifier: Notifier, verbosity: u8) -> NotifierResult<()> {
    let Notifier {
        mut relay,
        chat_log,
    } = notifier;

    let (layer, handle) = match chat_log {
        Some((layer, handle, forwarder)) => {
            tokio::spawn(forwarder.run());
            (Some(layer), Some(handle))
        }
        None => (None, None),
    };
    init_default_logging(verbosity, layer);

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| NotifierError::internal_error(format!("SIGINT handler: {e}")))?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| NotifierError::internal_error(format!("SIGTERM handler: {e}")))?;

    info!("Review notifier v{} started", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = relay.run() => {}
    }

    let stats = relay.stats();
    info!(
        polls = stats.polls,
        forwarded = stats.attempts_forwarded,
        failed_sends = stats.failed_sends,
        timeouts = stats.timeouts,
        connection_errors = stats.connection_errors,
        request_errors = stats.request_errors,
        unexpected_errors = stats.unexpected_errors,
        "Review notifier stopped"
    );

    if let Some(handle) = handle {
        if tokio::time::timeout(CHAT_LOG_FLUSH_TIMEOUT, handle.flush())
            .await
            .is_err()
        {
            warn!(
                target: review_notifier::observability::chat_log::FORWARDER_TARGET,
                "Gave up waiting for queued log lines to reach the chat"
            );
        }
    }

    Ok(())
}

fn handle_config_command(config: &NotifierConfig, show: bool) -> NotifierResult<()> {
    if show {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| NotifierError::internal_error(e.to_string()))?;
        println!("{rendered}");
    }

    info!("Configuration is valid");
    Ok(())
}
