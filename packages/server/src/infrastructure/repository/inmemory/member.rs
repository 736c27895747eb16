//! In-memory member registry.
//!
//! Backed by a sharded `DashMap`, so every mutation on one identity holds only
//! that identity's shard lock and joins of different identities do not wait on
//! a registry-wide lock. Snapshots copy the entries out before returning, which
//! lets callers iterate while other connections join and leave.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::domain::{
    ConnectionHandle, ConnectionId, DisplayName, Member, MemberRegistry, RenameError, SessionId,
};

/// In-memory [`MemberRegistry`].
///
/// Constructed once by the composition root and shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryMemberRegistry {
    members: DashMap<SessionId, Member>,
    next_seq: AtomicU64,
}

impl InMemoryMemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberRegistry for InMemoryMemberRegistry {
    fn join(&self, identity: SessionId, handle: ConnectionHandle) -> Member {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let member = Member::new(identity.clone(), handle, seq);

        if let Some(stale) = self.members.insert(identity.clone(), member.clone()) {
            tracing::info!(
                "Session '{}' rejoined; replacing connection #{}",
                identity,
                stale.handle().id().value()
            );
        }
        tracing::debug!("Session '{}' joined the registry", identity);

        member
    }

    fn leave(&self, identity: &SessionId) -> bool {
        let removed = self.members.remove(identity).is_some();
        if removed {
            tracing::debug!("Session '{}' left the registry", identity);
        }
        removed
    }

    fn release(&self, identity: &SessionId, connection: ConnectionId) -> bool {
        let removed = self
            .members
            .remove_if(identity, |_, member| member.handle().id() == connection)
            .is_some();
        if removed {
            tracing::debug!(
                "Session '{}' released by connection #{}",
                identity,
                connection.value()
            );
        }
        removed
    }

    fn rename(&self, identity: &SessionId, new_name: &str) -> Result<DisplayName, RenameError> {
        let name = DisplayName::new(new_name)?;

        match self.members.get_mut(identity) {
            Some(mut member) => {
                member.set_display_name(name.clone());
                Ok(name)
            }
            None => Err(RenameError::NotJoined(identity.to_string())),
        }
    }

    fn roster(&self) -> Vec<String> {
        self.members().iter().map(Member::label).collect()
    }

    fn lookup(&self, identity: &SessionId) -> Option<Member> {
        self.members.get(identity).map(|entry| entry.value().clone())
    }

    fn members(&self) -> Vec<Member> {
        let mut members: Vec<Member> = self
            .members
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by_key(Member::joined_seq);
        members
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}
