//! Connection registry trait.
//!
//! The registry is the single source of truth for who is connected. It only
//! mutates in-memory state and hands back handles; callers do the I/O.

use super::{ConnectionHandle, ConnectionId, DisplayName, Member, RenameError, SessionId};

/// Mapping from session identity to the live member.
///
/// Operations on the same identity are serialized; operations on different
/// identities may run concurrently. No method blocks on I/O.
#[cfg_attr(test, mockall::automock)]
pub trait MemberRegistry: Send + Sync {
    /// Insert a member with no display name, replacing any stale entry for
    /// the same identity.
    fn join(&self, identity: SessionId, handle: ConnectionHandle) -> Member;

    /// Remove the entry if present. Returns whether something was removed.
    fn leave(&self, identity: &SessionId) -> bool;

    /// Remove the entry only if it still belongs to `connection`.
    ///
    /// A connection that was replaced by a newer one for the same identity
    /// must not evict its successor.
    fn release(&self, identity: &SessionId, connection: ConnectionId) -> bool;

    /// Validate and set the display name. State is untouched on error.
    fn rename(&self, identity: &SessionId, new_name: &str) -> Result<DisplayName, RenameError>;

    /// Labels of all members in join order.
    fn roster(&self) -> Vec<String>;

    fn lookup(&self, identity: &SessionId) -> Option<Member>;

    /// Snapshot of all members in join order.
    fn members(&self) -> Vec<Member>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
