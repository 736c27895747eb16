//! Server session coordinator: the per-connection actor.
//!
//! One coordinator runs per upgraded connection and walks through
//! `Binding → Active → Closed`:
//!
//! - **Binding**: the identity comes from the session interceptor. Without
//!   one the connection is closed with a policy-violation code.
//! - **Active**: the member joins the registry, a writer task drains its
//!   outbound queue into the socket, and every inbound text frame is
//!   classified and dispatched. With a [`Keepalive`] the writer also pings
//!   the peer and ends the session when a pong does not come back in time.
//! - **Closed**: the registry entry is released exactly once, by a drop
//!   guard, whichever way the active phase ended.
//!
//! The server never reconnects; that is the client's job.

use std::{fmt::Display, sync::Arc, time::Duration};

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use kotatsu_shared::protocol::POLICY_VIOLATION;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
    domain::{Command, ConnectionHandle, ConnectionId, IdentityError, SessionId},
    usecase::DisconnectMemberUseCase,
};

use super::state::AppState;

/// Ping schedule for an active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keepalive {
    /// Interval between pings
    pub period: Duration,
    /// How long to wait for the matching pong before giving up
    pub timeout: Duration,
}

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Binding,
    Active,
    Closed,
}

pub struct SessionCoordinator {
    state: Arc<AppState>,
    phase: SessionPhase,
}

impl SessionCoordinator {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            phase: SessionPhase::Binding,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Drive one connection to completion.
    ///
    /// `outbound` and `inbound` are the two halves of the socket. Returns
    /// once the connection is closed; the phase is then
    /// [`SessionPhase::Closed`].
    pub async fn run<W, R, E>(&mut self, identity: Option<SessionId>, mut outbound: W, inbound: R)
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin + Send,
        E: Display + Send,
    {
        // Binding
        let Some(identity) = identity else {
            tracing::warn!("{}; closing with policy violation", IdentityError::Missing);
            let frame = CloseFrame {
                code: POLICY_VIOLATION,
                reason: Utf8Bytes::from_static("No session"),
            };
            if let Err(e) = outbound.send(Message::Close(Some(frame))).await {
                tracing::debug!("Failed to send close frame: {}", e);
            }
            self.phase = SessionPhase::Closed;
            return;
        };

        // Active
        let (tx, rx) = mpsc::channel(self.state.outbound_buffer);
        let handle = ConnectionHandle::new(tx);
        let connection = handle.id();
        // Only the registry keeps the sender: once the entry is removed or
        // replaced, the writer task sees the queue close and stops.
        drop(self.state.connect_member_usecase.execute(identity.clone(), handle));
        let _membership = MembershipGuard {
            usecase: self.state.disconnect_member_usecase.clone(),
            identity: identity.clone(),
            connection,
        };
        self.phase = SessionPhase::Active;

        let (pong_tx, pong_rx) = watch::channel(());
        let mut send_task = pusher_loop(rx, outbound, self.state.keepalive, pong_rx);

        // If either side finishes, stop the other
        tokio::select! {
            _ = self.receive_loop(&identity, inbound, &pong_tx) => send_task.abort(),
            _ = &mut send_task => {
                tracing::debug!("Writer for '{}' stopped; ending receive loop", identity);
            }
        };

        // Closed (the guard releases the registry entry on drop)
        self.phase = SessionPhase::Closed;
    }

    async fn receive_loop<R, E>(
        &self,
        identity: &SessionId,
        mut inbound: R,
        pongs: &watch::Sender<()>,
    ) where
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        while let Some(frame) = inbound.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", identity, e);
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    let command = Command::classify(text.as_str());
                    tracing::debug!("Received {:?} from '{}'", command, identity);

                    if let Err(e) = self
                        .state
                        .dispatch_command_usecase
                        .execute(identity, command)
                        .await
                    {
                        tracing::debug!("Command from '{}' rejected: {}", identity, e);
                    }
                }
                Message::Pong(_) => {
                    pongs.send_replace(());
                }
                Message::Close(_) => {
                    tracing::info!("Session '{}' requested close", identity);
                    break;
                }
                // binary and ping frames carry no chat semantics
                _ => {}
            }
        }
    }
}

/// Drains the member's outbound queue into the socket.
///
/// Also sends the keepalive pings. The task ends when the queue closes, a
/// write fails, or a ping goes unanswered for `timeout`.
fn pusher_loop<W>(
    mut rx: mpsc::Receiver<String>,
    mut sender: W,
    keepalive: Option<Keepalive>,
    mut pongs: watch::Receiver<()>,
) -> JoinHandle<()>
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Display + Send,
{
    tokio::spawn(async move {
        let mut ticker = keepalive.map(|keepalive| {
            let mut interval =
                tokio::time::interval_at(Instant::now() + keepalive.period, keepalive.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut pong_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                text = rx.recv() => {
                    let Some(text) = text else { break };
                    if let Err(e) = sender.send(Message::Text(text.into())).await {
                        tracing::debug!("Socket write failed: {}", e);
                        break;
                    }
                }
                _ = next_tick(&mut ticker) => {
                    if pong_deadline.is_some() {
                        continue;
                    }
                    if let Err(e) = sender.send(Message::Ping(Default::default())).await {
                        tracing::debug!("Ping write failed: {}", e);
                        break;
                    }
                    pong_deadline = keepalive.map(|keepalive| Instant::now() + keepalive.timeout);
                }
                Ok(()) = pongs.changed() => pong_deadline = None,
                _ = tokio::time::sleep_until(pong_deadline.unwrap_or_else(Instant::now)),
                    if pong_deadline.is_some() =>
                {
                    tracing::warn!("No pong within the keepalive timeout; dropping connection");
                    break;
                }
            }
        }
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Releases the registry entry when the coordinator finishes or is dropped.
struct MembershipGuard {
    usecase: Arc<DisconnectMemberUseCase>,
    identity: SessionId,
    connection: ConnectionId,
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        self.usecase.execute(&self.identity, self.connection);
    }
}
