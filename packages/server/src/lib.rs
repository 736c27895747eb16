//! Text-command WebSocket chat server.
//!
//! Every upgraded connection gets a session identity, joins the member
//! registry, and has each inbound text frame classified into a [`Command`]
//! which is then dispatched to the registry or the broadcaster.
//!
//! [`Command`]: domain::Command

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
