//! UseCase: メンバー切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, MemberRegistry, SessionId};

/// メンバー切断のユースケース
pub struct DisconnectMemberUseCase {
    registry: Arc<dyn MemberRegistry>,
}

impl DisconnectMemberUseCase {
    /// 新しい DisconnectMemberUseCase を作成
    pub fn new(registry: Arc<dyn MemberRegistry>) -> Self {
        Self { registry }
    }

    /// メンバー切断を実行
    ///
    /// # Arguments
    ///
    /// * `identity` - 切断したメンバーのセッション ID
    /// * `connection` - 切断した接続の ID。別の接続に置き換わっていれば何もしない
    ///
    /// # Returns
    ///
    /// * `true` - レジストリから取り除いた
    /// * `false` - 既に取り除かれているか、新しい接続が引き継いでいる
    pub fn execute(&self, identity: &SessionId, connection: ConnectionId) -> bool {
        let removed = self.registry.release(identity, connection);
        if removed {
            tracing::info!(
                "Session '{}' disconnected and removed from registry ({} online)",
                identity,
                self.registry.len()
            );
        } else {
            tracing::debug!(
                "Connection #{} of '{}' had no registry entry to remove",
                connection.value(),
                identity
            );
        }
        removed
    }
}
