//! Member: the live binding of a session identity to a connection.

use kotatsu_shared::protocol::MAX_NAME_CHARS;

use super::{ConnectionHandle, InvalidName, SessionId};

/// A validated display name (1–50 characters after trimming).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    /// 表示名を作成
    ///
    /// # Arguments
    ///
    /// * `raw` - 入力された名前。前後の空白は除去される
    ///
    /// # Returns
    ///
    /// * `Ok(DisplayName)` - 除去後 1〜50 文字
    /// * `Err(InvalidName)` - 空、または長すぎる
    pub fn new(raw: &str) -> Result<Self, InvalidName> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len == 0 {
            return Err(InvalidName::Empty);
        }
        if len > MAX_NAME_CHARS {
            return Err(InvalidName::TooLong {
                len,
                limit: MAX_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Registry entry for one live connection.
#[derive(Debug, Clone)]
pub struct Member {
    identity: SessionId,
    display_name: Option<DisplayName>,
    handle: ConnectionHandle,
    /// Monotonic join order, used to keep the roster stable.
    joined_seq: u64,
}

impl Member {
    /// A freshly joined member has no display name.
    pub fn new(identity: SessionId, handle: ConnectionHandle, joined_seq: u64) -> Self {
        Self {
            identity,
            display_name: None,
            handle,
            joined_seq,
        }
    }

    pub fn identity(&self) -> &SessionId {
        &self.identity
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn joined_seq(&self) -> u64 {
        self.joined_seq
    }

    pub fn set_display_name(&mut self, name: DisplayName) {
        self.display_name = Some(name);
    }

    /// Name shown to other members: the display name, or `guest-xxxxxx`
    /// until one has been set.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) => name.as_str().to_string(),
            None => format!("guest-{}", self.identity.short()),
        }
    }
}
