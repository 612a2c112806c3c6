mod cli;
mod input;
mod logging;
mod render;
mod settings;

use std::io;
use std::process::ExitCode;

use chatline_common::ConfigError;
use chatline_config::{ChatlineConfig, LogLevel};
use chatline_session::{FileStorage, QueryHandle, SessionRuntime};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Logging needs the configured level, so load config first and report
    // any failure once the subscriber is up.
    let loaded = chatline_config::load_config(args.config.as_deref());
    let default_directive = match &loaded {
        Ok(config) => config.logging.level.directive(),
        Err(_) => LogLevel::default().directive(),
    };
    let log_directive = args.log_level.as_deref().unwrap_or(default_directive);
    let (filter, rejected) = logging::build_filter(EnvFilter::from_default_env(), log_directive);
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    for part in rejected {
        tracing::warn!("Ignoring invalid log directive: {part}");
    }
    tracing::info!("chatline v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(args, loaded).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    args: cli::Args,
    loaded: Result<ChatlineConfig, ConfigError>,
) -> chatline_common::Result<()> {
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        ChatlineConfig::default()
    });

    let storage_dir = settings::storage_dir(&config)?;
    tracing::info!("Conversation stored in {}", storage_dir.display());

    let session_settings = settings::session_settings(&config, args.endpoint.as_deref());
    let (runtime, handle) = SessionRuntime::new(session_settings, FileStorage::new(storage_dir));

    if args.fresh {
        handle.reset().await?;
    } else {
        render::Printer::new(io::stdout()).history(runtime.messages())?;
    }

    tokio::spawn(render::run(runtime.subscribe()));
    tokio::spawn(input::read_lines(
        BufReader::new(tokio::io::stdin()),
        handle.clone(),
        runtime.subscribe(),
    ));
    tokio::spawn(shutdown_on_ctrl_c(handle));

    let messages = runtime.run().await;
    tracing::info!(messages = messages.len(), "Session closed");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: QueryHandle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Interrupted, shutting down");
        let _ = handle.shutdown().await;
    }
}
