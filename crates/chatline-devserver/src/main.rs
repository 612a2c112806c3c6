//! chatline-devserver: local `/chat` backend for development and tests.

use std::time::Duration;

use chatline_devserver::{serve, ServerOptions, CHAT_PATH};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "chatline-devserver", about = "Local streaming chat backend for chatline")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Delay between streamed answer fragments, in milliseconds.
    #[arg(long, default_value_t = 50)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatline_devserver=info".into()),
        )
        .init();

    let args = Args::parse();

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("chatline-devserver listening on ws://{}{}", addr, CHAT_PATH);

    serve(
        listener,
        ServerOptions {
            fragment_delay: Duration::from_millis(args.delay_ms),
        },
    )
    .await;
    Ok(())
}
