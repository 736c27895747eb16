//! Reconnecting WebSocket chat client.
//!
//! [`ConnectionManager`] owns the connection lifecycle and reconnects on a
//! fixed delay; everything it observes is delivered as [`ClientEvent`]s.
//! [`run_client`] wires it to a terminal.

pub mod error;
pub mod formatter;
pub mod manager;
pub mod probe;
pub mod runner;
pub mod state;
pub mod transport;

pub use error::{ClientError, SendError};
pub use manager::{ClientEvent, ClientHandle, ConnectionManager, Notice, RetryPolicy};
pub use runner::{ClientConfig, run_client};
pub use state::ConnectionState;
pub use transport::{Connection, Connector, SessionJar, TungsteniteConnector};
