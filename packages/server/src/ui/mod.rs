//! UI layer: the axum server, its handlers, and the per-connection coordinator.

mod handler;
mod middleware;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use server::{DEFAULT_PING_PERIOD, DEFAULT_PONG_TIMEOUT, Server, ServerConfig};
