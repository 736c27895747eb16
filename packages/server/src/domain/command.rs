//! The text command grammar.
//!
//! Commands are recognised by case-sensitive prefix, checked in the order
//! `/who`, `/user`, `/help`. Any other text starting with `/` is unknown;
//! anything else is a chat message.

/// A classified inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Text starting with `/who`: roster request.
    Who,
    /// Text starting with `/user`; holds the trimmed remainder, possibly empty.
    SetName(String),
    /// Text starting with `/help`
    Help,
    /// Chat text to broadcast.
    PlainMessage(String),
    /// Starts with `/` but is not a known command; holds the raw input.
    UnknownCommand(String),
}

impl Command {
    /// Classify raw frame text. Pure and total.
    pub fn classify(raw: &str) -> Command {
        if !raw.starts_with('/') {
            return Command::PlainMessage(raw.to_string());
        }

        if raw.starts_with("/who") {
            Command::Who
        } else if let Some(rest) = raw.strip_prefix("/user") {
            Command::SetName(rest.trim().to_string())
        } else if raw.starts_with("/help") {
            Command::Help
        } else {
            Command::UnknownCommand(raw.to_string())
        }
    }
}

/// The leading run of non-whitespace characters.
pub fn first_token(raw: &str) -> &str {
    split_first_token(raw).0
}

fn split_first_token(raw: &str) -> (&str, &str) {
    match raw.find(char::is_whitespace) {
        Some(index) => raw.split_at(index),
        None => (raw, ""),
    }
}
