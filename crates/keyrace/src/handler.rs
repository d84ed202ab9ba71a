//! Per-connection handler: decode inbound events, route them to rooms,
//! pump room broadcasts back out.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. All outbound traffic for the participant
//! (targeted replies and room broadcasts alike) funnels through one
//! channel drained by a writer task, so delivery order matches
//! processing order.

use std::sync::Arc;

use keyrace_protocol::{ClientMessage, Codec, ServerMessage};
use keyrace_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::KeyraceError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), KeyraceError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (out_tx, mut out_rx) =
        mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: everything addressed to this participant goes over
    // the wire in the order it was queued.
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let bytes = match codec.encode(&msg) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "failed to encode outbound message"
                        );
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    // Peer is gone; the read loop will notice too.
                    break;
                }
            }
        })
    };

    // Read loop: decode and dispatch until the peer hangs up.
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    %conn_id,
                    error = %e,
                    "ignoring undecodable frame"
                );
                continue;
            }
        };

        dispatch(&state, conn_id, &out_tx, msg).await;
    }

    // The departure must land before any further event referencing this
    // connection can be processed: sweep every room, delete the ones
    // left empty.
    state.registry.lock().await.disconnect(conn_id).await;
    writer.abort();
    Ok(())
}

/// Routes one decoded client message.
///
/// Admission paths answer failures with a targeted `errorMsg`; the
/// ready/progress/finish paths absorb unknown rooms silently, matching
/// the rest of their lenient handling.
async fn dispatch(
    state: &ServerState,
    conn_id: ConnectionId,
    out_tx: &mpsc::UnboundedSender<ServerMessage>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::CreateRoom { username } => {
            let text = state.texts.pick();
            let room_id = {
                let mut registry = state.registry.lock().await;
                registry.create(
                    text.clone(),
                    conn_id,
                    username.clone(),
                    out_tx.clone(),
                )
            };
            let _ = out_tx.send(ServerMessage::RoomCreated {
                room_id,
                text,
                username,
            });
        }

        ClientMessage::JoinRoom { room_id, username } => {
            let result = {
                let registry = state.registry.lock().await;
                match registry.get(&room_id) {
                    Ok(handle) => {
                        handle
                            .join(conn_id, username, out_tx.clone())
                            .await
                    }
                    Err(e) => Err(e),
                }
            };
            if let Err(e) = result {
                let _ = out_tx.send(ServerMessage::ErrorMsg {
                    message: e.to_string(),
                });
            }
        }

        ClientMessage::PlayerReady { room_id, username } => {
            let registry = state.registry.lock().await;
            if let Ok(handle) = registry.get(&room_id) {
                let _ = handle.ready(username).await;
            }
        }

        ClientMessage::ProgressUpdate {
            room_id,
            username,
            progress,
            wpm,
            correct_chars,
        } => {
            let registry = state.registry.lock().await;
            if let Ok(handle) = registry.get(&room_id) {
                let _ = handle
                    .progress(
                        conn_id,
                        username,
                        progress,
                        wpm,
                        correct_chars,
                    )
                    .await;
            }
        }

        ClientMessage::FinishedGame {
            room_id,
            username,
            wpm,
        } => {
            let registry = state.registry.lock().await;
            if let Ok(handle) = registry.get(&room_id) {
                let _ = handle.finish(username, wpm).await;
            }
        }
    }
}
