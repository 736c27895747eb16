//! Server state shared by every handler.

use std::sync::Arc;

use super::session::Keepalive;
use crate::{
    domain::IdentityStore,
    usecase::{ConnectMemberUseCase, DisconnectMemberUseCase, DispatchCommandUseCase},
};

/// Shared application state
pub struct AppState {
    /// セッション ID の発行・検証
    pub identity_store: IdentityStore,
    /// ConnectMemberUseCase（メンバー接続のユースケース）
    pub connect_member_usecase: Arc<ConnectMemberUseCase>,
    /// DisconnectMemberUseCase（メンバー切断のユースケース）
    pub disconnect_member_usecase: Arc<DisconnectMemberUseCase>,
    /// DispatchCommandUseCase（コマンド実行のユースケース）
    pub dispatch_command_usecase: Arc<DispatchCommandUseCase>,
    /// Capacity of each connection's outbound queue
    pub outbound_buffer: usize,
    /// Whether the session interceptor mints identities
    pub issue_sessions: bool,
    /// Ping schedule for active connections; `None` disables pings
    pub keepalive: Option<Keepalive>,
}
