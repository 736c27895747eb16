//! Session identity and the store that issues it.

use std::fmt;

use uuid::Uuid;

use super::IdentityError;

/// Opaque, unguessable token identifying one client context.
///
/// The same token is presented again on every reconnect from that context,
/// so it outlives any single connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Length of a well-formed token (simple-form UUID).
    pub const LEN: usize = 32;

    /// Validate a presented token.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        if raw.len() == Self::LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            Ok(Self(raw.to_string()))
        } else {
            Err(IdentityError::Malformed)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix used in logs and default labels; never the whole token.
    pub fn short(&self) -> &str {
        &self.0[..6]
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}…", self.short())
    }
}

/// Outcome of [`IdentityStore::bind_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// The presented token was valid and is returned unchanged.
    Existing(SessionId),
    /// A fresh token was generated; the caller must hand it back to the client.
    Minted(SessionId),
}

impl Binding {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Binding::Existing(id) | Binding::Minted(id) => id,
        }
    }

    pub fn into_session_id(self) -> SessionId {
        match self {
            Binding::Existing(id) | Binding::Minted(id) => id,
        }
    }

    pub fn is_minted(&self) -> bool {
        matches!(self, Binding::Minted(_))
    }
}

/// Issues and validates session identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStore;

impl IdentityStore {
    pub fn new() -> Self {
        Self
    }

    /// セッション ID を紐づける（無ければ発行する）
    ///
    /// 失敗しない。形式以外の検証（一意性など）は行わない。
    ///
    /// # Arguments
    ///
    /// * `existing` - クライアントが提示したトークン（Cookie の値）
    ///
    /// # Returns
    ///
    /// * `Binding::Existing` - 提示されたトークンが正しい形式だった
    /// * `Binding::Minted` - 新しく発行した。呼び出し側がクライアントに返す
    pub fn bind_or_create(&self, existing: Option<&str>) -> Binding {
        match existing.map(SessionId::parse) {
            Some(Ok(id)) => Binding::Existing(id),
            Some(Err(_)) => {
                tracing::debug!("Discarding malformed session token");
                Binding::Minted(self.mint())
            }
            None => Binding::Minted(self.mint()),
        }
    }

    fn mint(&self) -> SessionId {
        // v4 UUIDs come from the OS CSPRNG
        SessionId(Uuid::new_v4().simple().to_string())
    }
}
