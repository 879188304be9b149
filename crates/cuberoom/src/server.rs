//! `CuberoomServer` builder and accept loop.
//!
//! This is the entry point for running a Cuberoom server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;
use std::time::Duration;

use cuberoom_protocol::{Codec, JsonCodec};
use cuberoom_room::{RoomLogic, RoomManager};
use cuberoom_session::{SessionConfig, SessionManager};
use cuberoom_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::CuberoomError;
use crate::handler::handle_connection;

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<G: RoomLogic, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: Mutex<RoomManager<G>>,
    pub(crate) codec: C,
    /// The name clients use in `JoinOrCreate` to reach this room type.
    pub(crate) room_name: String,
    pub(crate) idle_timeout: Duration,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a Cuberoom server.
///
/// # Example
///
/// ```rust,ignore
/// use cuberoom::prelude::*;
///
/// let server = CuberoomServer::builder()
///     .bind("0.0.0.0:2567")
///     .room_name("my_room")
///     .build::<MyRoom>()
///     .await?;
/// server.run().await
/// ```
pub struct CuberoomServerBuilder {
    bind_addr: String,
    room_name: String,
    session_config: SessionConfig,
    idle_timeout: Duration,
    handshake_timeout: Duration,
}

impl CuberoomServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:2567".to_string(),
            room_name: "my_room".to_string(),
            session_config: SessionConfig::default(),
            idle_timeout: Duration::from_secs(15),
            handshake_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the name the room type is registered under.
    pub fn room_name(mut self, name: &str) -> Self {
        self.room_name = name.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Closes connections that send nothing for this long.
    /// Clients keep the connection open with heartbeats.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// How long a fresh connection may take to send its handshake.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the transport and builds the server for room type `G`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<G: RoomLogic>(
        self,
    ) -> Result<CuberoomServer<G, JsonCodec>, CuberoomError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            rooms: Mutex::new(RoomManager::new()),
            codec: JsonCodec,
            room_name: self.room_name,
            idle_timeout: self.idle_timeout,
            handshake_timeout: self.handshake_timeout,
        });

        Ok(CuberoomServer { transport, state })
    }
}

impl Default for CuberoomServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Cuberoom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CuberoomServer<G: RoomLogic, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<G, C>>,
}

impl<G, C> CuberoomServer<G, C>
where
    G: RoomLogic,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> CuberoomServerBuilder {
        CuberoomServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// future is dropped.
    pub async fn run(mut self) -> Result<(), CuberoomError> {
        tracing::info!(
            room_name = %self.state.room_name,
            "cuberoom server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
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
