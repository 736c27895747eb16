//! Client connection manager.
//!
//! A single driver task owns the connection state, so transitions never
//! interleave. The driver connects, pumps frames while connected, and on any
//! failure waits a fixed delay before trying again. Callers talk to it
//! through a [`ClientHandle`] and observe it through [`ClientEvent`]s.

use std::{fmt, time::Duration};

use futures_util::{SinkExt, StreamExt};
use kotatsu_shared::protocol::DEFAULT_RETRY_DELAY;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::SendError,
    state::ConnectionState,
    transport::{Connection, Connector},
};

/// When and how often to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Consecutive failures tolerated before giving up; `None` retries forever.
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever with a fixed delay.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_retries: None,
        }
    }

    pub fn bounded(delay: Duration, max_retries: u32) -> Self {
        Self {
            delay,
            max_retries: Some(max_retries),
        }
    }

    fn allows(&self, failures: u32) -> bool {
        self.max_retries.is_none_or(|max| failures <= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_DELAY)
    }
}

/// User-visible connection notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An established connection was lost
    Disconnected(String),
    /// A connection attempt failed
    UnableToConnect(String),
    /// Connected again after a failure
    Reconnected,
    /// Retries are exhausted; the manager has stopped
    GaveUp,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Disconnected(reason) => write!(f, "Disconnected. {}.", reason),
            Notice::UnableToConnect(_) => f.write_str("Unable to connect."),
            Notice::Reconnected => f.write_str("Reconnected."),
            Notice::GaveUp => f.write_str("Gave up reconnecting."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    State(ConnectionState),
    /// Text received from the server
    Message(String),
    Notice(Notice),
}

/// Cheap handle for sending text and stopping the manager.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    state: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl ClientHandle {
    /// Queue `text` for the current connection.
    ///
    /// Only accepted while connected. Text is never carried over to a later
    /// connection.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SendError> {
        if *self.state.borrow() != ConnectionState::Connected {
            tracing::debug!("Dropping outbound text while {}", *self.state.borrow());
            return Err(SendError::NotConnected);
        }
        self.outbound
            .send(text.into())
            .map_err(|_| SendError::NotConnected)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Stop the manager; no further connection attempts are made.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

pub struct ConnectionManager<C> {
    connector: C,
    policy: RetryPolicy,
}

impl<C: Connector + 'static> ConnectionManager<C> {
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self { connector, policy }
    }

    /// Spawn the driver task.
    ///
    /// The event channel closes once the driver has stopped, which happens
    /// after cancellation or when the retry policy gives up.
    pub fn start(self) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>, JoinHandle<()>) {
        self.start_with_token(CancellationToken::new())
    }

    /// Like [`start`](Self::start), stopping when `cancel` (or a parent of
    /// it) is cancelled.
    pub fn start_with_token(
        self,
        cancel: CancellationToken,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>, JoinHandle<()>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let driver = Driver {
            connector: self.connector,
            policy: self.policy,
            state: state_tx,
            events: events_tx,
            outbound: outbound_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(driver.run());

        let handle = ClientHandle {
            state: state_rx,
            outbound: outbound_tx,
            cancel,
        };
        (handle, events_rx, task)
    }
}

enum PumpEnd {
    Cancelled,
    Lost(String),
}

struct Driver<C> {
    connector: C,
    policy: RetryPolicy,
    state: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<ClientEvent>,
    outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
}

impl<C: Connector> Driver<C> {
    async fn run(mut self) {
        let mut failures: u32 = 0;
        let mut recovering = false;

        loop {
            self.transition(ConnectionState::Connecting);
            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.connector.connect() => result,
            };

            let notice = match attempt {
                Ok(connection) => {
                    failures = 0;
                    // Drop anything accepted just before the previous connection was lost
                    while self.outbound.try_recv().is_ok() {}
                    self.transition(ConnectionState::Connected);
                    if recovering {
                        recovering = false;
                        self.notify(Notice::Reconnected);
                    }

                    match self.pump(connection).await {
                        PumpEnd::Cancelled => break,
                        PumpEnd::Lost(reason) => Notice::Disconnected(reason),
                    }
                }
                Err(e) => {
                    tracing::debug!("Connection attempt failed: {}", e);
                    Notice::UnableToConnect(e.to_string())
                }
            };

            failures += 1;
            recovering = true;
            self.notify(notice);

            if !self.policy.allows(failures) {
                tracing::warn!("Giving up after {} consecutive failures", failures);
                self.notify(Notice::GaveUp);
                break;
            }

            self.transition(ConnectionState::AwaitingRetry);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }

        self.transition(ConnectionState::Disconnected);
    }

    async fn pump(&mut self, connection: Connection) -> PumpEnd {
        let Connection {
            mut outbound,
            mut inbound,
        } = connection;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    if let Err(e) = outbound.close().await {
                        tracing::debug!("Failed to close connection: {}", e);
                    }
                    return PumpEnd::Cancelled;
                }
                frame = inbound.next() => match frame {
                    Some(Ok(text)) => {
                        let _ = self.events.send(ClientEvent::Message(text));
                    }
                    Some(Err(e)) => return PumpEnd::Lost(e.to_string()),
                    None => return PumpEnd::Lost("connection closed".to_string()),
                },
                Some(text) = self.outbound.recv() => {
                    if let Err(e) = outbound.send(text).await {
                        return PumpEnd::Lost(e.to_string());
                    }
                }
            }
        }
    }

    fn transition(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        tracing::debug!("Connection state: {} -> {}", previous, next);
        let _ = self.events.send(ClientEvent::State(next));
    }

    fn notify(&self, notice: Notice) {
        tracing::info!("{}", notice);
        let _ = self.events.send(ClientEvent::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use futures_util::{sink, stream};
    use tokio::time::Instant;

    use super::*;
    use crate::error::ClientError;

    /// Server side of a scripted connection.
    struct Peer {
        to_client: mpsc::UnboundedSender<Result<String, ClientError>>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    fn connection_pair() -> (Connection, Peer) {
        let (to_client, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, from_client) = mpsc::unbounded_channel::<String>();

        let inbound = stream::unfold(inbound_rx, |mut rx| async move {
            let item = rx.recv().await?;
            Some((item, rx))
        });
        let outbound = sink::unfold(outbound_tx, |tx, text: String| async move {
            match tx.send(text) {
                Ok(()) => Ok(tx),
                Err(_) => Err(ClientError::Disconnected("peer gone".to_string())),
            }
        });

        let connection = Connection {
            outbound: Box::pin(outbound),
            inbound: Box::pin(inbound),
        };
        (connection, Peer {
            to_client,
            from_client,
        })
    }

    /// Hands out pre-scripted connection results, failing once exhausted.
    #[derive(Default)]
    struct ScriptedConnector {
        script: Mutex<VecDeque<Result<Connection, ClientError>>>,
        attempts: AtomicUsize,
    }

    impl ScriptedConnector {
        fn push_ok(&self) -> Peer {
            let (connection, peer) = connection_pair();
            self.script.lock().unwrap().push_back(Ok(connection));
            peer
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self) -> Result<Connection, ClientError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(ClientError::UnableToConnect("refused".to_string())))
        }
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
        events.recv().await.expect("driver stopped unexpectedly")
    }

    fn state(state: ConnectionState) -> ClientEvent {
        ClientEvent::State(state)
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_connection_reconnects_once_after_delay() {
        // テスト項目: 接続が切れると AwaitingRetry を経て、5000ms 後にちょうど 1 回再接続する
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let first = connector.push_ok();
        let _second = connector.push_ok();
        let (handle, mut events, task) =
            ConnectionManager::new(connector.clone(), RetryPolicy::default()).start();
        assert_eq!(next_event(&mut events).await, state(ConnectionState::Connecting));
        assert_eq!(next_event(&mut events).await, state(ConnectionState::Connected));

        // when (操作):
        drop(first);

        // then (期待する結果):
        assert!(matches!(
            next_event(&mut events).await,
            ClientEvent::Notice(Notice::Disconnected(_))
        ));
        assert_eq!(next_event(&mut events).await, state(ConnectionState::AwaitingRetry));
        let waiting_since = Instant::now();
        assert_eq!(connector.attempts(), 1);

        assert_eq!(next_event(&mut events).await, state(ConnectionState::Connecting));
        let waited = waiting_since.elapsed();
        assert!(waited >= Duration::from_millis(5000), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(5100), "waited {:?}", waited);
        assert_eq!(next_event(&mut events).await, state(ConnectionState::Connected));
        assert_eq!(
            next_event(&mut events).await,
            ClientEvent::Notice(Notice::Reconnected)
        );
        assert_eq!(connector.attempts(), 2);

        handle.cancel();
        assert_eq!(next_event(&mut events).await, state(ConnectionState::Disconnected));
        task.await.unwrap();
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_policy_gives_up() {
        // テスト項目: 再試行回数の上限に達すると GaveUp を通知して Disconnected で止まる
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let policy = RetryPolicy::bounded(Duration::from_millis(5000), 2);

        // when (操作):
        let (_handle, mut events, task) = ConnectionManager::new(connector.clone(), policy).start();
        task.await.unwrap();

        // then (期待する結果):
        let mut received = Vec::new();
        while let Some(event) = events.recv().await {
            received.push(event);
        }
        let unable = || {
            ClientEvent::Notice(Notice::UnableToConnect(
                "Unable to connect: refused".to_string(),
            ))
        };
        assert_eq!(
            received,
            vec![
                state(ConnectionState::Connecting),
                unable(),
                state(ConnectionState::AwaitingRetry),
                state(ConnectionState::Connecting),
                unable(),
                state(ConnectionState::AwaitingRetry),
                state(ConnectionState::Connecting),
                unable(),
                ClientEvent::Notice(Notice::GaveUp),
                state(ConnectionState::Disconnected),
            ]
        );
        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_counter_resets_after_successful_connect() {
        // テスト項目: 接続に成功すると連続失敗回数がリセットされる
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        connector
            .script
            .lock()
            .unwrap()
            .push_back(Err(ClientError::UnableToConnect("refused".to_string())));
        let peer = connector.push_ok();
        let policy = RetryPolicy::bounded(Duration::from_millis(100), 1);
        let (_handle, mut events, task) = ConnectionManager::new(connector.clone(), policy).start();

        // when (操作):
        loop {
            if next_event(&mut events).await == ClientEvent::Notice(Notice::Reconnected) {
                break;
            }
        }
        drop(peer);
        task.await.unwrap();

        // then (期待する結果):
        // without the reset the lost connection would have been the second
        // failure and no third attempt would be made
        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_is_rejected_while_not_connected() {
        // テスト項目: 接続していない間の送信は NotConnected で拒否される
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let (handle, mut events, _task) =
            ConnectionManager::new(connector.clone(), RetryPolicy::default()).start();
        while next_event(&mut events).await != state(ConnectionState::AwaitingRetry) {}

        // when (操作):
        let result = handle.send("hello");

        // then (期待する結果):
        assert_eq!(result, Err(SendError::NotConnected));
        assert_eq!(handle.state(), ConnectionState::AwaitingRetry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_and_receive_while_connected() {
        // テスト項目: 接続中は送信したテキストがサーバーに届き、受信したテキストがイベントになる
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let mut peer = connector.push_ok();
        let (handle, mut events, _task) =
            ConnectionManager::new(connector.clone(), RetryPolicy::default()).start();
        while next_event(&mut events).await != state(ConnectionState::Connected) {}

        // when (操作):
        handle.send("/who").unwrap();
        peer.to_client
            .send(Ok("[server::who] Alice".to_string()))
            .unwrap();

        // then (期待する結果):
        assert_eq!(peer.from_client.recv().await.as_deref(), Some("/who"));
        assert_eq!(
            next_event(&mut events).await,
            ClientEvent::Message("[server::who] Alice".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_error_is_reported_as_disconnected() {
        // テスト項目: 受信エラーは Disconnected として通知される
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let peer = connector.push_ok();
        let (_handle, mut events, _task) =
            ConnectionManager::new(connector.clone(), RetryPolicy::default()).start();
        while next_event(&mut events).await != state(ConnectionState::Connected) {}

        // when (操作):
        peer.to_client
            .send(Err(ClientError::Disconnected("reset".to_string())))
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            next_event(&mut events).await,
            ClientEvent::Notice(Notice::Disconnected("Disconnected: reset".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_retry_wait_stops_reconnecting() {
        // テスト項目: 再接続待ちの間にキャンセルすると、それ以上接続を試みない
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let (handle, mut events, task) =
            ConnectionManager::new(connector.clone(), RetryPolicy::default()).start();
        while next_event(&mut events).await != state(ConnectionState::AwaitingRetry) {}

        // when (操作):
        handle.cancel();
        task.await.unwrap();

        // then (期待する結果):
        assert_eq!(next_event(&mut events).await, state(ConnectionState::Disconnected));
        assert!(events.recv().await.is_none());
        assert_eq!(connector.attempts(), 1);
        assert!(handle.is_cancelled());
        assert_eq!(handle.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_token_cancels_connected_manager() {
        // テスト項目: 親トークンのキャンセルで接続中のマネージャーも止まる
        // given (前提条件):
        let connector = Arc::new(ScriptedConnector::default());
        let _peer = connector.push_ok();
        let parent = CancellationToken::new();
        let (_handle, mut events, task) =
            ConnectionManager::new(connector.clone(), RetryPolicy::default())
                .start_with_token(parent.child_token());
        while next_event(&mut events).await != state(ConnectionState::Connected) {}

        // when (操作):
        parent.cancel();
        task.await.unwrap();

        // then (期待する結果):
        assert_eq!(next_event(&mut events).await, state(ConnectionState::Disconnected));
        assert_eq!(connector.attempts(), 1);
    }

    #[test]
    fn test_notice_display() {
        // テスト項目: 通知の表示文字列
        // given (前提条件):
        let disconnected = Notice::Disconnected("connection closed".to_string());
        let unable = Notice::UnableToConnect("refused".to_string());

        // when (操作):
        let texts = (disconnected.to_string(), unable.to_string());

        // then (期待する結果):
        assert_eq!(texts.0, "Disconnected. connection closed.");
        assert_eq!(texts.1, "Unable to connect.");
    }
}
