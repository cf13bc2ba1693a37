use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use conclave_core::{LinkRole, ParticipantId};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::link::{LinkCommand, LinkEvent, LinkState};
use crate::media::LocalMedia;
use crate::transport::{PeerTransport, SdpKind, TransportEvent, TransportFactory};

const COMMAND_BUFFER: usize = 64;
const TRANSPORT_BUFFER: usize = 64;

/// Negotiation-needed signals landing within this window collapse into a
/// single offer, so attaching several tracks back to back does not produce
/// an offer per track.
const OFFER_DEBOUNCE: Duration = Duration::from_millis(50);

/// The session's handle to one link task.
#[derive(Clone)]
pub struct LinkHandle {
    peer_id: ParticipantId,
    role: LinkRole,
    cmd_tx: mpsc::Sender<LinkCommand>,
    state_rx: watch::Receiver<LinkState>,
}

impl LinkHandle {
    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    pub async fn send(&self, cmd: LinkCommand) {
        if self.cmd_tx.send(cmd).await.is_err() {
            debug!(peer = %self.peer_id, "link task already finished");
        }
    }

    pub async fn close(&self) {
        self.send(LinkCommand::Close).await;
    }
}

/// Drives one pairwise negotiation from creation to an established link or
/// teardown.
///
/// Runs as its own task: commands from the session and events from the
/// transport are handled strictly one at a time, while separate links under
/// the same session interleave freely. Candidates that race ahead of the
/// session-description exchange are buffered in arrival order and replayed
/// once the remote description lands; the buffer has no cap, it lives only
/// as long as the link.
pub struct PeerLink {
    peer_id: ParticipantId,
    role: LinkRole,
    state: LinkState,
    state_tx: watch::Sender<LinkState>,
    transport: Arc<dyn PeerTransport>,
    media: Option<Arc<LocalMedia>>,
    pending_offer: Option<String>,
    pending_candidates: VecDeque<String>,
    remote_description_set: bool,
    offer_wanted: bool,
    events: mpsc::UnboundedSender<LinkEvent>,
    cmd_rx: mpsc::Receiver<LinkCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
}

impl PeerLink {
    /// Creates the transport, spawns the link task and, when local media is
    /// already available, queues its attachment as the first command.
    pub async fn spawn(
        peer_id: ParticipantId,
        role: LinkRole,
        factory: &dyn TransportFactory,
        events: mpsc::UnboundedSender<LinkEvent>,
        media: Option<Arc<LocalMedia>>,
    ) -> Result<LinkHandle, TransportError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_BUFFER);
        let transport = factory.create(transport_tx).await?;
        let (state_tx, state_rx) = watch::channel(LinkState::Created);

        let link = PeerLink {
            peer_id: peer_id.clone(),
            role,
            state: LinkState::Created,
            state_tx,
            transport,
            media: None,
            pending_offer: None,
            pending_candidates: VecDeque::new(),
            remote_description_set: false,
            offer_wanted: false,
            events,
            cmd_rx,
            transport_rx,
        };

        let handle = LinkHandle {
            peer_id,
            role,
            cmd_tx: cmd_tx.clone(),
            state_rx,
        };

        tokio::spawn(link.run());

        if let Some(media) = media {
            let _ = cmd_tx.send(LinkCommand::AttachLocalMedia(media)).await;
        }

        Ok(handle)
    }

    async fn run(mut self) {
        self.set_state(LinkState::AwaitingLocalMedia);

        let offer_timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(offer_timer);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd, offer_timer.as_mut()).await,
                    // Handle dropped: the session is gone, tear down.
                    None => self.close(None).await,
                },
                evt = self.transport_rx.recv() => match evt {
                    Some(evt) => self.handle_transport_event(evt, offer_timer.as_mut()).await,
                    None => self.fail("transport event channel closed").await,
                },
                _ = offer_timer.as_mut(), if self.offer_wanted && self.media.is_some() => {
                    self.offer_wanted = false;
                    self.negotiate_offer().await;
                }
            }

            if self.state == LinkState::Closed {
                break;
            }
        }

        debug!(peer = %self.peer_id, "link task finished");
    }

    async fn handle_command(&mut self, cmd: LinkCommand, timer: Pin<&mut Sleep>) {
        if self.state == LinkState::Closed {
            return;
        }
        match cmd {
            LinkCommand::AttachLocalMedia(media) => self.attach_local_media(media, timer).await,
            LinkCommand::RemoteOffer(sdp) => self.remote_offer(sdp).await,
            LinkCommand::RemoteAnswer(sdp) => self.remote_answer(sdp).await,
            LinkCommand::RemoteCandidate(candidate) => self.remote_candidate(candidate).await,
            LinkCommand::Close => self.close(None).await,
        }
    }

    async fn handle_transport_event(&mut self, evt: TransportEvent, timer: Pin<&mut Sleep>) {
        if self.state == LinkState::Closed {
            return;
        }
        match evt {
            TransportEvent::NegotiationNeeded => {
                if self.role != LinkRole::Initiator {
                    // The responder answers offers; it never produces one.
                    return;
                }
                self.offer_wanted = true;
                if self.media.is_some() {
                    timer.reset(Instant::now() + OFFER_DEBOUNCE);
                }
            }
            TransportEvent::CandidateGenerated(candidate) => {
                self.emit(LinkEvent::Candidate {
                    peer: self.peer_id.clone(),
                    candidate,
                });
            }
            TransportEvent::RemoteMedia(media) => {
                self.emit(LinkEvent::RemoteMedia {
                    peer: self.peer_id.clone(),
                    media,
                });
            }
            TransportEvent::Disconnected => {
                self.fail("transport disconnected").await;
            }
        }
    }

    async fn attach_local_media(&mut self, media: Arc<LocalMedia>, timer: Pin<&mut Sleep>) {
        if self.media.is_some() {
            warn!(peer = %self.peer_id, "local media already attached");
            return;
        }
        if let Err(e) = self.transport.attach_media(Arc::clone(&media)).await {
            self.fail(&format!("failed to attach local media: {e}")).await;
            return;
        }
        self.media = Some(media);

        match self.role {
            LinkRole::Initiator => {
                self.set_state(LinkState::NegotiatingOffer);
                if self.offer_wanted {
                    // A renegotiation request arrived before media did.
                    timer.reset(Instant::now() + OFFER_DEBOUNCE);
                }
            }
            LinkRole::Responder => {
                self.set_state(LinkState::AwaitingOffer);
                if let Some(sdp) = self.pending_offer.take() {
                    self.accept_remote_offer(sdp).await;
                }
            }
        }
    }

    async fn remote_offer(&mut self, sdp: String) {
        if self.role == LinkRole::Initiator {
            warn!(peer = %self.peer_id, "dropping offer aimed at the initiating side");
            return;
        }
        if self.media.is_none() {
            // Queued until local media is ready; a newer offer supersedes.
            self.pending_offer = Some(sdp);
            return;
        }
        self.accept_remote_offer(sdp).await;
    }

    async fn accept_remote_offer(&mut self, sdp: String) {
        if let Err(e) = self
            .transport
            .set_remote_description(SdpKind::Offer, sdp)
            .await
        {
            self.fail(&format!("failed to apply remote offer: {e}")).await;
            return;
        }
        self.remote_description_set = true;
        if !self.replay_candidates().await {
            return;
        }
        match self.transport.create_answer().await {
            Ok(answer) => {
                self.set_state(LinkState::AnswerSent);
                self.emit(LinkEvent::Answer {
                    peer: self.peer_id.clone(),
                    sdp: answer,
                });
                self.set_state(LinkState::Connected);
                self.emit(LinkEvent::Connected {
                    peer: self.peer_id.clone(),
                });
            }
            Err(e) => self.fail(&format!("failed to create answer: {e}")).await,
        }
    }

    async fn remote_answer(&mut self, sdp: String) {
        if self.role != LinkRole::Initiator {
            debug!(peer = %self.peer_id, "dropping answer on responding side");
            return;
        }
        if !matches!(self.state, LinkState::OfferSent | LinkState::AwaitingAnswer) {
            debug!(peer = %self.peer_id, state = ?self.state, "dropping stale answer");
            return;
        }
        if let Err(e) = self
            .transport
            .set_remote_description(SdpKind::Answer, sdp)
            .await
        {
            self.fail(&format!("failed to apply remote answer: {e}")).await;
            return;
        }
        self.remote_description_set = true;
        if !self.replay_candidates().await {
            return;
        }
        self.set_state(LinkState::Connected);
        self.emit(LinkEvent::Connected {
            peer: self.peer_id.clone(),
        });
    }

    async fn remote_candidate(&mut self, candidate: String) {
        if !self.remote_description_set {
            self.pending_candidates.push_back(candidate);
            return;
        }
        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            self.fail(&format!("failed to apply candidate: {e}")).await;
        }
    }

    /// Flushes candidates buffered ahead of the remote description, in the
    /// order they arrived. Returns false when the link died doing so.
    async fn replay_candidates(&mut self) -> bool {
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                self.fail(&format!("failed to apply buffered candidate: {e}"))
                    .await;
                return false;
            }
        }
        true
    }

    async fn negotiate_offer(&mut self) {
        if self.media.is_none() {
            return;
        }
        if !matches!(
            self.state,
            LinkState::NegotiatingOffer | LinkState::Connected
        ) {
            debug!(peer = %self.peer_id, state = ?self.state, "offer suppressed in current state");
            return;
        }
        match self.transport.create_offer().await {
            Ok(sdp) => {
                self.set_state(LinkState::OfferSent);
                self.emit(LinkEvent::Offer {
                    peer: self.peer_id.clone(),
                    sdp,
                });
                self.set_state(LinkState::AwaitingAnswer);
            }
            Err(e) => self.fail(&format!("failed to create offer: {e}")).await,
        }
    }

    /// Tears the link down. Idempotent; a link failure never propagates
    /// beyond this one pair.
    async fn close(&mut self, reason: Option<String>) {
        if self.state == LinkState::Closed {
            return;
        }
        if let Err(e) = self.transport.close().await {
            debug!(peer = %self.peer_id, "transport close failed: {e}");
        }
        self.pending_candidates.clear();
        self.pending_offer = None;
        self.offer_wanted = false;
        self.set_state(LinkState::Closed);
        self.emit(LinkEvent::Closed {
            peer: self.peer_id.clone(),
            reason,
        });
    }

    async fn fail(&mut self, reason: &str) {
        warn!(peer = %self.peer_id, "closing link: {reason}");
        self.close(Some(reason.to_owned())).await;
    }

    fn set_state(&mut self, state: LinkState) {
        self.state = state;
        let _ = self.state_tx.send(state);
    }

    fn emit(&self, event: LinkEvent) {
        if self.events.send(event).is_err() {
            debug!(peer = %self.peer_id, "session event channel closed");
        }
    }
}
