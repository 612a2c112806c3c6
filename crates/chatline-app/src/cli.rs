use std::path::PathBuf;

use clap::Parser;

/// chatline: talk to a streaming chat backend from the terminal.
#[derive(Parser, Debug)]
#[command(name = "chatline", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebSocket endpoint override, e.g. ws://localhost:8080/chat.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Log filter directive override (e.g. "chatline=debug").
    #[arg(long)]
    pub log_level: Option<String>,

    /// Start with an empty conversation.
    #[arg(long)]
    pub fresh: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
