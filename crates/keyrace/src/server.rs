//! `KeyraceServer` builder and accept loop.
//!
//! This is the entry point for running a Keyrace server. It ties the
//! layers together: transport → protocol → rooms.

use std::sync::Arc;

use keyrace_protocol::JsonCodec;
use keyrace_room::{RoomConfig, RoomRegistry};
use keyrace_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{KeyraceError, TextBank};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks; the
/// registry sits behind a `Mutex`, room actors do not.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) texts: TextBank,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Keyrace server.
///
/// # Example
///
/// ```rust,no_run
/// use keyrace::prelude::*;
///
/// # async fn run() -> Result<(), KeyraceError> {
/// let server = KeyraceServer::builder()
///     .bind("0.0.0.0:4000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct KeyraceServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    texts: TextBank,
}

impl KeyraceServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            room_config: RoomConfig::default(),
            texts: TextBank::new(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration (countdown, minimum field).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the race passage bank.
    pub fn texts(mut self, texts: TextBank) -> Self {
        self.texts = texts;
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<KeyraceServer, KeyraceError> {
        let transport =
            WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::with_config(
                self.room_config,
            )),
            texts: self.texts,
            codec: JsonCodec,
        });

        Ok(KeyraceServer { transport, state })
    }
}

impl Default for KeyraceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Keyrace server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct KeyraceServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl KeyraceServer {
    /// Creates a new builder.
    pub fn builder() -> KeyraceServerBuilder {
        KeyraceServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), KeyraceError> {
        tracing::info!("keyrace server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
