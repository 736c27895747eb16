//! Outbound delivery to connected members.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{DeliveryError, SessionId};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one physical connection, as opposed to the session it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Write side of one connection's outbound queue.
///
/// The queue is bounded and drained by a single writer task per connection,
/// which keeps per-recipient delivery in FIFO order.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<String>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self {
            id: ConnectionId::next(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue `text`, waiting at most `timeout` for room in the queue.
    pub async fn deliver(&self, text: String, timeout: Duration) -> Result<(), DeliveryError> {
        match tokio::time::timeout(timeout, self.sender.send(text)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DeliveryError::Closed),
            Err(_) => Err(DeliveryError::SlowConsumer(timeout)),
        }
    }
}

/// Sends text to members.
///
/// Implementations isolate failures per recipient: nothing here aborts the
/// caller's request.
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Single best-effort write to one member.
    async fn send_to(&self, recipient: &SessionId, text: &str) -> Result<(), DeliveryError>;

    /// Fan out to every joined member except `excluding`.
    ///
    /// Returns how many recipients accepted the message.
    async fn broadcast(&self, text: &str, excluding: Option<&SessionId>) -> usize;
}
