//! Domain errors.

use std::time::Duration;

use thiserror::Error;

/// Why a requested display name was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidName {
    /// Nothing left after trimming.
    #[error("display name is empty")]
    Empty,

    /// Longer than the character limit after trimming.
    #[error("display name is {len} characters long (limit {limit})")]
    TooLong { len: usize, limit: usize },
}

/// Failure of [`MemberRegistry::rename`](super::MemberRegistry::rename).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error(transparent)]
    Invalid(#[from] InvalidName),

    /// The identity has no live member entry.
    #[error("session '{0}' is not joined")]
    NotJoined(String),
}

/// Identity could not be established for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The request reached the upgrade without any session.
    #[error("no session bound to the connection")]
    Missing,

    /// The presented token is not a well-formed session identity.
    #[error("malformed session token")]
    Malformed,
}

/// A single recipient could not be written to.
///
/// Never propagated past the broadcaster; the recipient's own coordinator
/// notices the dead connection and leaves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("recipient '{0}' is not joined")]
    NotFound(String),

    #[error("recipient connection is closed")]
    Closed,

    #[error("recipient did not drain its queue within {0:?}")]
    SlowConsumer(Duration),
}
