//! Transport seam between the connection manager and the network.

use std::{
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt, future};
use kotatsu_shared::protocol::{SESSION_COOKIE, session_from_set_cookie};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header},
    },
};

use crate::error::ClientError;

pub type BoxSink = Pin<Box<dyn Sink<String, Error = ClientError> + Send>>;
pub type BoxStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// An established connection: outbound text in, inbound text out.
///
/// The inbound stream ends (or yields an error) when the connection is lost.
pub struct Connection {
    pub outbound: BoxSink,
    pub inbound: BoxStream,
}

/// Opens connections for the manager.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connection, ClientError>;
}

#[async_trait]
impl<T: Connector + ?Sized> Connector for Arc<T> {
    async fn connect(&self) -> Result<Connection, ClientError> {
        (**self).connect().await
    }
}

/// Remembers the session token so the same identity is presented on every
/// reconnect.
#[derive(Debug, Clone, Default)]
pub struct SessionJar(Arc<Mutex<Option<String>>>);

impl SessionJar {
    pub fn get(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Store `token` if there is one; `None` keeps the current value.
    pub fn remember(&self, token: Option<&str>) {
        if let Some(token) = token {
            *self.slot() = Some(token.to_string());
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// WebSocket connector backed by `tokio-tungstenite`.
pub struct TungsteniteConnector {
    url: String,
    jar: SessionJar,
}

impl TungsteniteConnector {
    pub fn new(url: impl Into<String>, jar: SessionJar) -> Self {
        Self {
            url: url.into(),
            jar,
        }
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self) -> Result<Connection, ClientError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        if let Some(token) = self.jar.get() {
            let cookie = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token))
                .map_err(|e| ClientError::UnableToConnect(e.to_string()))?;
            request.headers_mut().insert(header::COOKIE, cookie);
        }

        let (socket, response) = connect_async(request)
            .await
            .map_err(|e| ClientError::UnableToConnect(e.to_string()))?;

        self.jar.remember(
            response
                .headers()
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find_map(session_from_set_cookie),
        );
        tracing::debug!("Connected to {}", self.url);

        let (write, read) = socket.split();

        let outbound = write
            .with(|text: String| future::ready(Ok::<_, tungstenite::Error>(Message::text(text))))
            .sink_map_err(|e| ClientError::Disconnected(e.to_string()));

        let inbound = read.filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    let reason = match frame {
                        Some(frame) => format!(
                            "closed by server ({}) {}",
                            u16::from(frame.code),
                            frame.reason.as_str()
                        ),
                        None => "closed by server".to_string(),
                    };
                    Some(Err(ClientError::Disconnected(reason)))
                }
                // binary, ping and pong frames carry no chat text
                Ok(_) => None,
                Err(e) => Some(Err(ClientError::Disconnected(e.to_string()))),
            })
        });

        Ok(Connection {
            outbound: Box::pin(outbound),
            inbound: Box::pin(inbound),
        })
    }
}
