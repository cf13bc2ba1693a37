use axum::extract::ws::Message;
use conclave_core::{ParticipantId, RoomId, SignalMessage};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::room::RoomRegistry;

/// Stateless pass-through router for signaling envelopes.
///
/// Knows which connection currently owns a `ParticipantId` and nothing else:
/// payloads are forwarded verbatim, with `from` rewritten to the
/// authenticated sender. Join/leave fan-out goes through the [`RoomRegistry`]
/// so every notification target comes from the same membership snapshot the
/// mutation produced.
pub struct SignalingRelay {
    registry: Arc<RoomRegistry>,
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
}

impl SignalingRelay {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            peers: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Binds a participant id to the send half of its connection.
    pub fn register(&self, id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.peers.insert(id, tx);
    }

    pub fn unregister(&self, id: &ParticipantId) {
        self.peers.remove(id);
    }

    pub fn is_connected(&self, id: &ParticipantId) -> bool {
        self.peers.contains_key(id)
    }

    /// Serializes and delivers one message. A disconnected target is not an
    /// error: a stale target means the remote side already left, and the
    /// sender cannot usefully act on that.
    pub fn send(&self, id: &ParticipantId, msg: &SignalMessage) {
        let Some(peer) = self.peers.get(id) else {
            debug!(%id, "dropping signal for disconnected participant");
            return;
        };
        match serde_json::to_string(msg) {
            Ok(json) => {
                if peer.send(Message::Text(json.into())).is_err() {
                    debug!(%id, "peer connection closed mid-send");
                }
            }
            Err(e) => error!("failed to serialize signal message: {e}"),
        }
    }

    /// Adds the participant to the room, tells it who was already there and
    /// tells everyone who was already there about it.
    pub fn join_room(&self, room: &RoomId, id: &ParticipantId) {
        let existing = self.registry.join(room, id.clone());
        self.send(
            id,
            &SignalMessage::ExistingUsers {
                participants: existing.clone(),
            },
        );
        for member in &existing {
            self.send(
                member,
                &SignalMessage::UserJoined {
                    participant_id: id.clone(),
                },
            );
        }
    }

    /// Removes the participant from the room and notifies the members that
    /// remain.
    pub fn leave_room(&self, room: &RoomId, id: &ParticipantId) {
        for member in self.registry.leave(room, id) {
            self.send(
                &member,
                &SignalMessage::UserLeft {
                    participant_id: id.clone(),
                },
            );
        }
    }

    /// Routes an offer/answer/candidate envelope to its target, rewriting
    /// `from` to the sender the relay authenticated at registration.
    pub fn route(&self, sender: &ParticipantId, envelope: SignalMessage) {
        let (target, tagged) = match envelope {
            SignalMessage::Offer { to, sdp, .. } => (
                to.clone(),
                SignalMessage::Offer {
                    from: sender.clone(),
                    to,
                    sdp,
                },
            ),
            SignalMessage::Answer { to, sdp, .. } => (
                to.clone(),
                SignalMessage::Answer {
                    from: sender.clone(),
                    to,
                    sdp,
                },
            ),
            SignalMessage::IceCandidate { to, candidate, .. } => (
                to.clone(),
                SignalMessage::IceCandidate {
                    from: sender.clone(),
                    to,
                    candidate,
                },
            ),
            other => {
                warn!(%sender, ?other, "refusing to route non-envelope message");
                return;
            }
        };
        self.send(&target, &tagged);
    }
}
