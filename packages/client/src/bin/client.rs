//! Reconnecting WebSocket chat client.
//!
//! Sends every line typed on stdin to the server and prints what comes
//! back. When the connection drops it reconnects after a fixed delay,
//! presenting the same session so the server sees the same member.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kotatsu-client
//! cargo run --bin kotatsu-client -- --url ws://127.0.0.1:3000/ws --max-retries 3
//! ```

use std::time::Duration;

use clap::Parser;
use kotatsu_client::{ClientConfig, RetryPolicy, run_client};
use kotatsu_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kotatsu-client")]
#[command(about = "WebSocket chat client with automatic reconnection", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Delay between reconnection attempts, in milliseconds
    #[arg(long, default_value = "5000")]
    retry_delay_ms: u64,

    /// Give up after this many consecutive failures (retry forever if unset)
    #[arg(long)]
    max_retries: Option<u32>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = ClientConfig {
        url: args.url,
        retry: RetryPolicy {
            delay: Duration::from_millis(args.retry_delay_ms),
            max_retries: args.max_retries,
        },
    };

    // Run the client
    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
