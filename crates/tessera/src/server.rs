//! `TesseraServer` builder and server loop.
//!
//! This is the entry point for running a Tessera coordinator. It ties
//! together all the layers: transport, protocol, session, lobby.

use std::sync::Arc;

use tokio::sync::Mutex;

use tessera_lobby::{Lobby, LobbyConfig};
use tessera_protocol::JsonCodec;
use tessera_session::ParticipantRegistry;
use tessera_transport::{Transport, WebSocketTransport};

use crate::TesseraError;
use crate::dispatch::ChannelDispatcher;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry sits behind a `Mutex`; the lobby and dispatcher carry their
/// own interior locking.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<ParticipantRegistry>,
    pub(crate) lobby: Lobby,
    pub(crate) dispatcher: ChannelDispatcher,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Tessera server.
///
/// # Example
///
/// ```rust,ignore
/// use tessera::TesseraServer;
///
/// let server = TesseraServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TesseraServerBuilder {
    bind_addr: String,
    lobby_config: LobbyConfig,
}

impl TesseraServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            lobby_config: LobbyConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the lobby configuration.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Builds the server: binds the WebSocket listener and assembles the
    /// shared state.
    pub async fn build(self) -> Result<TesseraServer, TesseraError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(ParticipantRegistry::new()),
            lobby: Lobby::new(self.lobby_config),
            dispatcher: ChannelDispatcher::new(),
            codec: JsonCodec,
        });

        Ok(TesseraServer { transport, state })
    }
}

impl Default for TesseraServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tessera server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TesseraServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl TesseraServer {
    /// Creates a new builder.
    pub fn builder() -> TesseraServerBuilder {
        TesseraServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, TesseraError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// one. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), TesseraError> {
        tracing::info!("Tessera server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
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
