use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use conclave_core::{ParticipantId, RoomId, SignalMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::signaling::SignalingRelay;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<SignalingRelay>) {
    let participant_id = ParticipantId::new();
    info!(%participant_id, "new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    relay.register(participant_id.clone(), tx);
    relay.send(
        &participant_id,
        &SignalMessage::Welcome {
            participant_id: participant_id.clone(),
        },
    );

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // The receive loop runs inline so that room cleanup below always happens
    // before the connection task finishes, however the socket goes away.
    let mut joined_room: Option<RoomId> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                Ok(SignalMessage::Join { room }) => {
                    info!(%participant_id, %room, "join");
                    if let Some(previous) = joined_room.replace(room.clone()) {
                        relay.leave_room(&previous, &participant_id);
                    }
                    relay.join_room(&room, &participant_id);
                }
                Ok(
                    envelope @ (SignalMessage::Offer { .. }
                    | SignalMessage::Answer { .. }
                    | SignalMessage::IceCandidate { .. }),
                ) => {
                    relay.route(&participant_id, envelope);
                }
                Ok(other) => {
                    debug!(%participant_id, ?other, "ignoring unexpected client message");
                }
                Err(e) => warn!(%participant_id, "invalid signal message: {e}"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(room) = joined_room {
        relay.leave_room(&room, &participant_id);
    }
    relay.unregister(&participant_id);
    send_task.abort();

    info!(%participant_id, "signaling connection closed");
}
