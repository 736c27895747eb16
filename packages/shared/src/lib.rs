//! Utilities shared by the Kotatsu server and client.

pub mod logger;
pub mod protocol;
pub mod time;
