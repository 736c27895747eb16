//! UseCase: メンバー接続処理

use std::sync::Arc;

use crate::domain::{ConnectionHandle, Member, MemberRegistry, SessionId};

/// メンバー接続のユースケース
pub struct ConnectMemberUseCase {
    registry: Arc<dyn MemberRegistry>,
}

impl ConnectMemberUseCase {
    /// 新しい ConnectMemberUseCase を作成
    pub fn new(registry: Arc<dyn MemberRegistry>) -> Self {
        Self { registry }
    }

    /// メンバー接続を実行
    ///
    /// 同じセッション ID の古い接続があれば置き換える。古いハンドルが
    /// レジストリから外れると、その書き込みタスクが終わり古いソケットも閉じる。
    ///
    /// # Arguments
    ///
    /// * `identity` - 接続に紐づいたセッション ID
    /// * `handle` - この接続の送信キュー
    ///
    /// # Returns
    ///
    /// 登録されたメンバー（表示名は未設定）
    pub fn execute(&self, identity: SessionId, handle: ConnectionHandle) -> Member {
        let member = self.registry.join(identity, handle);
        tracing::info!(
            "Session '{}' connected as connection #{} ({} online)",
            member.identity(),
            member.handle().id().value(),
            self.registry.len()
        );
        member
    }
}
