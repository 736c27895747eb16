//! Text-command WebSocket chat server.
//!
//! Every connection is bound to a session identity, joins the shared
//! registry, and can run `/who`, `/user <name>` and `/help`. Any other text
//! is broadcast to everyone else.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kotatsu-server
//! cargo run --bin kotatsu-server -- --host 0.0.0.0 --port 3000
//! ```

use std::time::Duration;

use clap::Parser;
use kotatsu_server::ui::{Server, ServerConfig};
use kotatsu_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kotatsu-server")]
#[command(about = "WebSocket chat server with text commands and broadcast", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Capacity of each connection's outbound message queue
    #[arg(long, default_value = "64")]
    outbound_buffer: usize,

    /// Longest time one slow recipient may hold up a delivery, in milliseconds
    #[arg(long, default_value = "1000")]
    delivery_timeout_ms: u64,

    /// Seconds between keepalive pings (0 disables pings)
    #[arg(long, default_value = "60")]
    ping_period_secs: u64,

    /// Seconds to wait for a pong before dropping the connection
    #[arg(long, default_value = "15")]
    pong_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        outbound_buffer: args.outbound_buffer,
        delivery_timeout: Duration::from_millis(args.delivery_timeout_ms),
        ping_period: (args.ping_period_secs > 0)
            .then(|| Duration::from_secs(args.ping_period_secs)),
        pong_timeout: Duration::from_secs(args.pong_timeout_secs),
        ..ServerConfig::default()
    };

    // Registry, MessagePusher and UseCases are wired by the composition helper
    let (server, _registry) = Server::in_memory(&config);

    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
