//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use kotatsu_shared::protocol::{HEALTH_PATH, HELLO_PATH, WS_PATH};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    domain::{IdentityStore, MemberRegistry},
    infrastructure::{
        message_pusher::{RegistryBroadcaster, broadcaster::DEFAULT_DELIVERY_TIMEOUT},
        repository::InMemoryMemberRegistry,
    },
    usecase::{ConnectMemberUseCase, DisconnectMemberUseCase, DispatchCommandUseCase},
};

use super::{
    handler::{health_check, hello, websocket_handler},
    middleware::session_interceptor,
    session::Keepalive,
    signal::shutdown_signal,
    state::AppState,
};

/// Default interval between keepalive pings.
pub const DEFAULT_PING_PERIOD: Duration = Duration::from_secs(60);

/// Default wait for a pong before a connection counts as dead.
pub const DEFAULT_PONG_TIMEOUT: Duration = Duration::from_secs(15);

/// Tunables for one server instance.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Capacity of each connection's outbound queue
    pub outbound_buffer: usize,
    /// Longest a single recipient write may suspend a broadcast
    pub delivery_timeout: Duration,
    /// Mint session identities for requests that arrive without one
    pub issue_sessions: bool,
    /// Ping interval for active connections; `None` disables pings
    pub ping_period: Option<Duration>,
    /// How long a ping may go unanswered before the connection is dropped
    pub pong_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            outbound_buffer: 64,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            issue_sessions: true,
            ping_period: Some(DEFAULT_PING_PERIOD),
            pong_timeout: DEFAULT_PONG_TIMEOUT,
        }
    }
}

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_member_usecase,
///     disconnect_member_usecase,
///     dispatch_command_usecase,
///     &config,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `connect_member_usecase` - UseCase for member connection
    /// * `disconnect_member_usecase` - UseCase for member disconnection
    /// * `dispatch_command_usecase` - UseCase for command dispatch
    /// * `config` - Queue size and session settings
    pub fn new(
        connect_member_usecase: Arc<ConnectMemberUseCase>,
        disconnect_member_usecase: Arc<DisconnectMemberUseCase>,
        dispatch_command_usecase: Arc<DispatchCommandUseCase>,
        config: &ServerConfig,
    ) -> Self {
        let state = Arc::new(AppState {
            identity_store: IdentityStore::new(),
            connect_member_usecase,
            disconnect_member_usecase,
            dispatch_command_usecase,
            outbound_buffer: config.outbound_buffer.max(1),
            issue_sessions: config.issue_sessions,
            keepalive: config.ping_period.map(|period| Keepalive {
                period,
                timeout: config.pong_timeout,
            }),
        });
        Self { state }
    }

    /// Wire an in-memory registry and the registry broadcaster.
    ///
    /// Returns the registry as well so callers can observe membership.
    pub fn in_memory(config: &ServerConfig) -> (Self, Arc<dyn MemberRegistry>) {
        // 1. Registry
        let registry: Arc<dyn MemberRegistry> = Arc::new(InMemoryMemberRegistry::new());

        // 2. MessagePusher
        let broadcaster = Arc::new(RegistryBroadcaster::new(
            registry.clone(),
            config.delivery_timeout,
        ));

        // 3. UseCases
        let connect_member_usecase = Arc::new(ConnectMemberUseCase::new(registry.clone()));
        let disconnect_member_usecase = Arc::new(DisconnectMemberUseCase::new(registry.clone()));
        let dispatch_command_usecase =
            Arc::new(DispatchCommandUseCase::new(registry.clone(), broadcaster));

        // 4. Server
        let server = Self::new(
            connect_member_usecase,
            disconnect_member_usecase,
            dispatch_command_usecase,
            config,
        );
        (server, registry)
    }

    /// Build the router with all endpoints and layers.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route(WS_PATH, get(websocket_handler))
            // HTTP エンドポイント
            .route(HELLO_PATH, get(hello))
            .route(HEALTH_PATH, get(health_check))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                session_interceptor,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the WebSocket chat server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}{}", bind_addr, WS_PATH);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
