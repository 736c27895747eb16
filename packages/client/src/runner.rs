//! Terminal front end for the connection manager.

use std::io::Write;

use kotatsu_shared::time::now_millis;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    formatter::MessageFormatter,
    manager::{ClientEvent, ConnectionManager, RetryPolicy},
    probe::{http_base_from_ws, probe},
    transport::{SessionJar, TungsteniteConnector},
};

const PROMPT: &str = "> ";

/// Client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub retry: RetryPolicy,
}

/// Run the chat client until Ctrl+C / Ctrl+D or until retries are exhausted.
pub async fn run_client(config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let jar = SessionJar::default();
    let http_base = http_base_from_ws(&config.url)?;

    match probe(&http_base, &jar).await {
        Ok(body) => tracing::info!("Server at {} says '{}'", http_base, body.trim()),
        // the manager keeps retrying, so an unreachable server is not fatal here
        Err(e) => tracing::warn!("Liveness probe failed: {}", e),
    }

    let connector = TungsteniteConnector::new(config.url.clone(), jar);
    let (handle, mut events, driver) = ConnectionManager::new(connector, config.retry).start();

    println!(
        "\nType messages and press Enter to send. /help lists commands. Press Ctrl+C to exit.\n"
    );

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut input_open = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Message(text)) => {
                    print!("{}", MessageFormatter::format_message(&text, now_millis()));
                    redisplay_prompt();
                }
                Some(ClientEvent::Notice(notice)) => {
                    print!("{}", MessageFormatter::format_notice(&notice, now_millis()));
                    redisplay_prompt();
                }
                Some(ClientEvent::State(state)) => tracing::debug!("State: {}", state),
                // the driver has stopped
                None => break,
            },
            line = input_rx.recv(), if input_open => match line {
                Some(line) => {
                    if handle.send(line.as_str()).is_err() {
                        print!("{}", MessageFormatter::format_dropped(&line));
                        redisplay_prompt();
                    }
                }
                None => {
                    // Ctrl+C or Ctrl+D
                    input_open = false;
                    handle.cancel();
                }
            },
        }
    }

    driver.await?;
    tracing::info!("Client stopped");
    Ok(())
}

/// Redisplay the prompt after printing a message
fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
