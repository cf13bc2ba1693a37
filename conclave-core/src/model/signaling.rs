use serde::{Deserialize, Serialize};

use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;

/// One STUN/TURN server entry, in the shape browsers expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// The `{iceServers: [...]}` payload handed to clients over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IceConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl IceConfig {
    /// Public STUN fallback used when no credentials are configured or the
    /// credential upstream is unreachable.
    pub fn default_stun() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

/// Everything that crosses the signaling channel, in both directions.
///
/// `Offer`, `Answer` and `IceCandidate` are envelopes: a client addresses
/// them with `to`, and the relay rewrites `from` to the authenticated sender
/// before delivery. The `sdp` and `candidate` payloads are never inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum SignalMessage {
    Join {
        room: RoomId,
    },
    Welcome {
        participant_id: ParticipantId,
    },
    ExistingUsers {
        participants: Vec<ParticipantId>,
    },
    UserJoined {
        participant_id: ParticipantId,
    },
    UserLeft {
        participant_id: ParticipantId,
    },
    Offer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: String,
    },
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: String,
    },
    IceCandidate {
        from: ParticipantId,
        to: ParticipantId,
        candidate: String,
    },
}
