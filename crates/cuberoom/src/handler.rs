//! Per-connection handler: handshake, message routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version → create session
//!   2. Send HandshakeAck carrying the new session id
//!   3. Loop: inbound envelopes from the client and outbound messages
//!      from the client's room, whichever comes first
//!   4. On exit: leave the room and drop the session

use std::sync::Arc;
use std::time::Instant;

use cuberoom_protocol::{
    Channel, Codec, Envelope, Payload, ProtocolError, RoomListEntry,
    SessionId, SystemMessage,
};
use cuberoom_room::{
    ClientSender, RoomError, RoomLogic, RoomOutbound, lobby_rooms,
};
use cuberoom_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::CuberoomError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// Drop guard that takes a session out of its room and the registry
/// when the handler exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct SessionGuard<G: RoomLogic, C: Codec> {
    session_id: SessionId,
    /// Set when the client announced its departure.
    consented: bool,
    state: Arc<ServerState<G, C>>,
}

impl<G: RoomLogic, C: Codec> Drop for SessionGuard<G, C> {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let session_id = self.session_id.clone();
        let consented = self.consented;
        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            {
                let mut rooms = state.rooms.lock().await;
                if rooms.session_room(&session_id).is_some() {
                    if let Err(e) = rooms.leave_room(&session_id, consented).await {
                        tracing::debug!(%session_id, error = %e, "leave on disconnect failed");
                    }
                }
            }
            let mut sessions = state.sessions.lock().await;
            let _ = sessions.disconnect(&session_id, consented);
        });
    }
}

/// Wraps outgoing payloads in envelopes and writes them to the client.
struct EnvelopeWriter<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<'a, C: Codec> EnvelopeWriter<'a, C> {
    fn new(conn: &'a WebSocketConnection, codec: &'a C) -> Self {
        Self {
            conn,
            codec,
            seq: 0,
            start: Instant::now(),
        }
    }

    /// Milliseconds since the connection was accepted.
    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&mut self, payload: Payload) -> Result<(), CuberoomError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.elapsed_ms(),
            channel: Channel::ReliableOrdered,
            payload,
        };
        self.seq += 1;
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn system(
        &mut self,
        msg: SystemMessage,
    ) -> Result<(), CuberoomError> {
        self.send(Payload::System(msg)).await
    }

    async fn error(
        &mut self,
        code: u16,
        message: impl Into<String>,
    ) -> Result<(), CuberoomError> {
        self.system(SystemMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G, C>>,
) -> Result<(), CuberoomError>
where
    G: RoomLogic,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut out = EnvelopeWriter::new(&conn, &state.codec);
    let session_id = perform_handshake(&conn, &state, &mut out).await?;
    tracing::info!(%conn_id, %session_id, "session connected");

    let mut guard = SessionGuard {
        session_id: session_id.clone(),
        consented: false,
        state: Arc::clone(&state),
    };

    // Every room this session joins delivers through this channel.
    let (tx, mut rx) = mpsc::unbounded_channel::<RoomOutbound<G>>();

    // Only inbound traffic counts as activity.
    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            () = &mut idle => {
                tracing::info!(%session_id, "connection idle, closing");
                break;
            }
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%session_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%session_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut()
                    .reset(tokio::time::Instant::now() + state.idle_timeout);

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::warn!(%session_id, error = %e, "undecodable envelope, skipping");
                        continue;
                    }
                };

                match envelope.payload {
                    Payload::System(msg) => {
                        let should_close = handle_system_message(
                            &state, &session_id, msg, &tx, &mut out,
                        )
                        .await?;
                        if should_close {
                            guard.consented = true;
                            break;
                        }
                    }
                    Payload::Game(data) => {
                        handle_game_message(&state, &session_id, data, &mut out)
                            .await?;
                    }
                }
            }
            Some(outbound) = rx.recv() => {
                forward_outbound(&state.codec, outbound, &mut out).await?;
            }
        }
    }

    let _ = conn.close().await;
    // guard drops here → leave + session disconnect fire.
    Ok(())
}

/// Receives the Handshake, validates it, creates the session, and
/// sends the HandshakeAck.
async fn perform_handshake<G, C>(
    conn: &WebSocketConnection,
    state: &ServerState<G, C>,
    out: &mut EnvelopeWriter<'_, C>,
) -> Result<SessionId, CuberoomError>
where
    G: RoomLogic,
    C: Codec,
{
    let data =
        match tokio::time::timeout(state.handshake_timeout, conn.recv()).await
        {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(ProtocolError::InvalidMessage(
                    "connection closed before handshake".into(),
                )
                .into());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ProtocolError::InvalidMessage(
                    "handshake timed out".into(),
                )
                .into());
            }
        };

    let envelope: Envelope = state.codec.decode(&data)?;

    let version = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version }) => version,
        _ => {
            out.error(400, "expected Handshake").await?;
            return Err(ProtocolError::InvalidMessage(
                "first message must be Handshake".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        out.error(
            400,
            format!(
                "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
            ),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage(
            "protocol version mismatch".into(),
        )
        .into());
    }

    let session = state.sessions.lock().await.create()?;

    let server_time = out.elapsed_ms();
    if let Err(e) = out
        .system(SystemMessage::HandshakeAck {
            session_id: session.session_id.clone(),
            server_time,
        })
        .await
    {
        let _ = state
            .sessions
            .lock()
            .await
            .disconnect(&session.session_id, false);
        return Err(e);
    }

    Ok(session.session_id)
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<G, C>(
    state: &ServerState<G, C>,
    session_id: &SessionId,
    msg: SystemMessage,
    tx: &ClientSender<G>,
    out: &mut EnvelopeWriter<'_, C>,
) -> Result<bool, CuberoomError>
where
    G: RoomLogic,
    C: Codec,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let server_time = out.elapsed_ms();
            out.system(SystemMessage::HeartbeatAck {
                client_time,
                server_time,
            })
            .await?;
        }

        SystemMessage::JoinRoom { room_id, options } => {
            let Some(options) = decode_options::<G, C>(state, &options, out).await?
            else {
                return Ok(false);
            };

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms
                    .join_room(session_id.clone(), room_id, options, tx.clone())
                    .await
            };

            match result {
                Ok(()) => {
                    out.system(SystemMessage::RoomJoined {
                        room_id,
                        session_id: session_id.clone(),
                    })
                    .await?;
                }
                Err(e) => out.error(404, e.to_string()).await?,
            }
        }

        SystemMessage::JoinOrCreate { name, options } => {
            if name != state.room_name {
                out.error(404, format!("no room type registered as {name:?}"))
                    .await?;
                return Ok(false);
            }
            let Some(options) = decode_options::<G, C>(state, &options, out).await?
            else {
                return Ok(false);
            };

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms
                    .join_or_create(session_id.clone(), options, tx.clone())
                    .await
            };

            match result {
                Ok(room_id) => {
                    out.system(SystemMessage::RoomJoined {
                        room_id,
                        session_id: session_id.clone(),
                    })
                    .await?;
                }
                Err(e) => out.error(409, e.to_string()).await?,
            }
        }

        SystemMessage::ListRooms => {
            let handles = state.rooms.lock().await.room_handles();
            let infos = lobby_rooms(&handles).await;
            let rooms = infos
                .into_iter()
                .map(|info| RoomListEntry {
                    room_id: info.room_id,
                    name: info.name.unwrap_or_else(|| state.room_name.clone()),
                    client_count: info.client_count,
                    max_clients: info.max_clients,
                })
                .collect();
            out.system(SystemMessage::RoomList { rooms }).await?;
        }

        SystemMessage::LeaveRoom => {
            let mut rooms = state.rooms.lock().await;
            if let Err(e) = rooms.leave_room(session_id, true).await {
                tracing::debug!(%session_id, error = %e, "leave room failed");
            }
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(%session_id, %reason, "client disconnected");
            return Ok(true);
        }

        _ => {
            tracing::debug!(%session_id, "ignoring unexpected system message");
        }
    }

    Ok(false)
}

/// Decodes join options, replying with `Error 400` when they are invalid.
async fn decode_options<G, C>(
    state: &ServerState<G, C>,
    raw: &[u8],
    out: &mut EnvelopeWriter<'_, C>,
) -> Result<Option<G::Options>, CuberoomError>
where
    G: RoomLogic,
    C: Codec,
{
    match state.codec.decode_or_default(raw) {
        Ok(options) => Ok(Some(options)),
        Err(e) => {
            out.error(400, format!("invalid join options: {e}")).await?;
            Ok(None)
        }
    }
}

/// Handles a game message: decode, route to the session's room.
async fn handle_game_message<G, C>(
    state: &ServerState<G, C>,
    session_id: &SessionId,
    game_data: Vec<u8>,
    out: &mut EnvelopeWriter<'_, C>,
) -> Result<(), CuberoomError>
where
    G: RoomLogic,
    C: Codec,
{
    let client_msg: G::ClientMessage = match state.codec.decode(&game_data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(%session_id, error = %e, "invalid game message");
            out.error(400, format!("invalid game message: {e}")).await?;
            return Ok(());
        }
    };

    let result = state
        .rooms
        .lock()
        .await
        .route_message(session_id, client_msg)
        .await;

    match result {
        Ok(()) => {}
        // A move racing a leave.
        Err(RoomError::NoRoom(_)) => {
            tracing::debug!(%session_id, "game message outside a room, dropped");
        }
        Err(e) => out.error(400, e.to_string()).await?,
    }

    Ok(())
}

/// Writes one item from the room to the client.
async fn forward_outbound<G, C>(
    codec: &C,
    outbound: RoomOutbound<G>,
    out: &mut EnvelopeWriter<'_, C>,
) -> Result<(), CuberoomError>
where
    G: RoomLogic,
    C: Codec,
{
    match outbound {
        RoomOutbound::Message(msg) => {
            let bytes = codec.encode(&msg)?;
            out.send(Payload::Game(bytes)).await
        }
        RoomOutbound::Closed(room_id) => {
            out.system(SystemMessage::RoomClosed { room_id }).await
        }
    }
}
