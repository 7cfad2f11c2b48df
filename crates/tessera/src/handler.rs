//! Per-connection handler: identification and request routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Wait for `identify` → register (or resume) with the registry
//!   2. Send `connected` → attach the participant's outbound channel
//!   3. Pump: outbound events → socket; inbound actions → lobby

use std::sync::Arc;

use tessera_lobby::{Event, EventDispatcher};
use tessera_protocol::{ClientRequest, Codec, ParticipantId, ServerEvent};
use tessera_session::{IdentifiedParticipant, Participant, RegistryError};
use tessera_transport::{ConnectionId, MessageConnection, WebSocketConnection};

use crate::TesseraError;
use crate::server::ServerState;

/// Drop guard that detaches a participant when its handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async locks.
/// Both cleanups are keyed (connection id, channel epoch) so a stale
/// guard can never tear down a successor connection's state.
struct ConnectionGuard {
    conn_id: ConnectionId,
    participant_id: ParticipantId,
    epoch: u64,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let participant_id = self.participant_id;
        let epoch = self.epoch;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.lock().await.forget(conn_id);
            state.dispatcher.detach(participant_id, epoch).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), TesseraError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: identification gate ---
    let Some(identified) = await_identify(&conn, &state).await? else {
        tracing::debug!(%conn_id, "connection closed before identifying");
        return Ok(());
    };
    let participant = identified.participant.clone();

    // The guard is armed before the first send so a failure anywhere
    // past this point still detaches the registry record.
    let (epoch, mut rx) = state.dispatcher.attach(participant.id).await;
    let _guard = ConnectionGuard {
        conn_id,
        participant_id: participant.id,
        epoch,
        state: Arc::clone(&state),
    };

    // `connected` goes directly to the socket ahead of anything the
    // freshly attached channel may already hold.
    let connected = ServerEvent::Connected {
        resume_token: identified.resume_token.clone(),
        name: participant.name.clone(),
    };
    let bytes = state.codec.encode(&connected)?;
    conn.send(&bytes).await?;

    tracing::info!(
        %conn_id,
        participant = %participant.id,
        name = %participant.name,
        resumed = identified.resumed,
        "participant identified"
    );

    // --- Step 2: event pump ---
    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(event) = outbound else {
                    // A newer connection took over this identity.
                    tracing::debug!(
                        participant = %participant.id,
                        "outbound channel closed, dropping connection"
                    );
                    break;
                };
                let bytes = state.codec.encode(&event)?;
                conn.send(&bytes).await?;
            }
            inbound = conn.recv() => {
                match inbound {
                    Ok(Some(data)) => {
                        let request: ClientRequest = match state.codec.decode(&data) {
                            Ok(request) => request,
                            Err(e) => {
                                tracing::debug!(
                                    participant = %participant.id,
                                    error = %e,
                                    "failed to decode request"
                                );
                                continue;
                            }
                        };
                        dispatch_request(&state, &participant, request).await;
                    }
                    Ok(None) => {
                        tracing::info!(participant = %participant.id, "connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(participant = %participant.id, error = %e, "recv error");
                        break;
                    }
                }
            }
        }
    }

    // _guard drops here → registry detach and channel teardown fire.
    Ok(())
}

/// Waits for a valid `identify` on a fresh connection.
///
/// A name conflict answers `nameUnavailable` and keeps waiting so the
/// client can retry on the same connection. Any other action before
/// identification is dropped. Returns `None` when the connection closes
/// first.
async fn await_identify(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
) -> Result<Option<IdentifiedParticipant>, TesseraError> {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let request: ClientRequest = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(conn = %conn.id(), error = %e, "failed to decode request");
                continue;
            }
        };

        let (name, resume_token) = match request {
            ClientRequest::Identify { name, resume_token } => (name, resume_token),
            other => {
                tracing::debug!(
                    conn = %conn.id(),
                    action = other.kind(),
                    "dropping action from unidentified connection"
                );
                continue;
            }
        };

        let identified = {
            let mut registry = state.registry.lock().await;
            registry.identify(conn.id(), name.as_deref(), resume_token.as_deref())
        };
        match identified {
            Ok(identified) => return Ok(Some(identified)),
            Err(RegistryError::NameTaken(name)) => {
                tracing::debug!(conn = %conn.id(), %name, "requested name unavailable");
                let bytes = state.codec.encode(&ServerEvent::NameUnavailable)?;
                conn.send(&bytes).await?;
            }
        }
    }
}

/// Routes one identified request to the lobby and hands the produced
/// events to the dispatcher.
async fn dispatch_request(
    state: &Arc<ServerState>,
    participant: &Participant,
    request: ClientRequest,
) {
    tracing::debug!(
        participant = %participant.id,
        action = request.kind(),
        "dispatching request"
    );

    let events = match request {
        ClientRequest::Identify { .. } => {
            // Identity is fixed once established on a connection.
            tracing::debug!(
                participant = %participant.id,
                "ignoring identify on an identified connection"
            );
            return;
        }
        ClientRequest::JoinRoom { room_name } => {
            state.lobby.join_room(participant, &room_name).await
        }
        ClientRequest::LeaveRoom { room_key } => {
            state.lobby.leave_room(participant, &room_key).await
        }
        ClientRequest::StartGame { size_x, size_y } => {
            state.lobby.start_game(participant, size_x, size_y).await
        }
        ClientRequest::PlaceTile { x, y } => {
            state.lobby.place_tile(participant, x, y).await
        }
        ClientRequest::RoomList => {
            let rooms = state.lobby.room_list().await;
            vec![Event::to(participant.id, ServerEvent::RoomList { rooms })]
        }
    };

    state.dispatcher.deliver(events).await;
}
