//! UseCase errors.

use thiserror::Error;

use crate::domain::InvalidName;

/// A command that was answered with a hint instead of taking effect.
///
/// These are recoverable: the sender has already been told, and the
/// connection stays up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("rejected display name: {0}")]
    InvalidName(#[from] InvalidName),

    #[error("unknown command {0}")]
    UnknownCommand(String),

    #[error("session '{0}' is not joined")]
    NotJoined(String),
}
