//! Registry-backed [`MessagePusher`].
//!
//! ## 責務
//!
//! - レジストリから接続ハンドルを引き、各接続のキューへ書き込む
//! - 受信者ごとの失敗を隔離する（1 人の失敗でブロードキャストを中断しない）
//!
//! ## 設計ノート
//!
//! ブロードキャストはレジストリのスナップショットを取ってから配送するため、
//! 配送中にレジストリのロックを保持しない。遅い受信者への書き込みは
//! `delivery_timeout` で打ち切る。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::domain::{DeliveryError, Member, MemberRegistry, MessagePusher, SessionId};

/// Default bound on how long one recipient may stall a write.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_millis(1000);

pub struct RegistryBroadcaster {
    registry: Arc<dyn MemberRegistry>,
    delivery_timeout: Duration,
}

impl RegistryBroadcaster {
    pub fn new(registry: Arc<dyn MemberRegistry>, delivery_timeout: Duration) -> Self {
        Self {
            registry,
            delivery_timeout,
        }
    }

    async fn deliver(&self, member: &Member, text: &str) -> Result<(), DeliveryError> {
        let result = member
            .handle()
            .deliver(text.to_string(), self.delivery_timeout)
            .await;

        match &result {
            Ok(()) => tracing::debug!("Pushed message to '{}'", member.identity()),
            Err(e) => tracing::warn!("Failed to push message to '{}': {}", member.identity(), e),
        }
        result
    }
}

#[async_trait]
impl MessagePusher for RegistryBroadcaster {
    async fn send_to(&self, recipient: &SessionId, text: &str) -> Result<(), DeliveryError> {
        let Some(member) = self.registry.lookup(recipient) else {
            tracing::warn!("Recipient '{}' not found, skipping", recipient);
            return Err(DeliveryError::NotFound(recipient.to_string()));
        };
        self.deliver(&member, text).await
    }

    async fn broadcast(&self, text: &str, excluding: Option<&SessionId>) -> usize {
        let targets: Vec<Member> = self
            .registry
            .members()
            .into_iter()
            .filter(|member| Some(member.identity()) != excluding)
            .collect();

        let results = join_all(targets.iter().map(|member| self.deliver(member, text))).await;
        let delivered = results.iter().filter(|result| result.is_ok()).count();

        tracing::debug!(
            "Broadcast delivered to {}/{} recipients",
            delivered,
            targets.len()
        );
        delivered
    }
}
