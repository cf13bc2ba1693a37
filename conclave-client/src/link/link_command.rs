use std::sync::Arc;

use conclave_core::ParticipantId;

use crate::media::{LocalMedia, RemoteMedia};

/// Commands the owning session dispatches into a link's task. Each is
/// handled to completion before the next, so one link never interleaves two
/// negotiation steps.
pub enum LinkCommand {
    AttachLocalMedia(Arc<LocalMedia>),
    RemoteOffer(String),
    RemoteAnswer(String),
    RemoteCandidate(String),
    Close,
}

/// What a link reports back to its session: outbound signaling to relay and
/// lifecycle changes to surface.
#[derive(Debug)]
pub enum LinkEvent {
    Offer {
        peer: ParticipantId,
        sdp: String,
    },
    Answer {
        peer: ParticipantId,
        sdp: String,
    },
    Candidate {
        peer: ParticipantId,
        candidate: String,
    },
    Connected {
        peer: ParticipantId,
    },
    RemoteMedia {
        peer: ParticipantId,
        media: RemoteMedia,
    },
    Closed {
        peer: ParticipantId,
        reason: Option<String>,
    },
}

/// Where a link is in its negotiation.
///
/// Initiator path: `Created → AwaitingLocalMedia → NegotiatingOffer →
/// OfferSent → AwaitingAnswer → Connected`. Responder path: `Created →
/// AwaitingLocalMedia → AwaitingOffer → AnswerSent → Connected`. Any state
/// can drop to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Created,
    AwaitingLocalMedia,
    NegotiatingOffer,
    OfferSent,
    AwaitingAnswer,
    AwaitingOffer,
    AnswerSent,
    Connected,
    Closed,
}
