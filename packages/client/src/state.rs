//! Client connection states.

use std::fmt;

/// Where the client is in its connection lifecycle.
///
/// ```text
/// Disconnected --start--> Connecting --ok--> Connected
///                             ^   |              |
///                       delay |   | err          | end / error
///                             |   v              v
///                          AwaitingRetry <-------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    AwaitingRetry,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::AwaitingRetry => "awaiting retry",
        };
        f.write_str(name)
    }
}
