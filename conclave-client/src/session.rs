use std::collections::HashMap;
use std::sync::Arc;

use conclave_core::{LinkRole, ParticipantId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::link::{LinkCommand, LinkEvent, LinkHandle, PeerLink};
use crate::media::{LocalMedia, RemoteMedia};
use crate::signaling::SignalingClient;
use crate::transport::TransportFactory;

const COMMAND_BUFFER: usize = 16;

/// Requests from the embedding application.
pub enum SessionCommand {
    SetLocalMedia(Arc<LocalMedia>),
    Leave,
}

/// What the session surfaces to the embedding application.
#[derive(Debug)]
pub enum SessionEvent {
    /// The server accepted the connection and assigned us an identity.
    Ready { participant_id: ParticipantId },
    /// A pairwise link finished negotiating.
    PeerConnected { peer: ParticipantId },
    /// A remote peer's track started arriving.
    PeerMedia {
        peer: ParticipantId,
        media: RemoteMedia,
    },
    /// The peer left the room; its link and media are gone.
    PeerLeft { peer: ParticipantId },
    /// A link died on its own (negotiation or transport failure). Other
    /// links are unaffected.
    LinkClosed {
        peer: ParticipantId,
        reason: Option<String>,
    },
    /// The session is over: every link closed and local media released.
    Disconnected,
}

/// The application's handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Hands the session its local capture tracks. May happen at any point
    /// relative to joining; links created before this are attached now,
    /// links created after pick it up at creation.
    pub async fn set_local_media(&self, media: Arc<LocalMedia>) {
        if self
            .cmd_tx
            .send(SessionCommand::SetLocalMedia(media))
            .await
            .is_err()
        {
            debug!("session already finished");
        }
    }

    /// Leaves the room: closes every link, releases media, then drops the
    /// signaling connection.
    pub async fn leave(&self) {
        if self.cmd_tx.send(SessionCommand::Leave).await.is_err() {
            debug!("session already finished");
        }
    }
}

/// One connected client: owns the local media handle and every pairwise
/// link, and is the only thing that touches the link map.
///
/// The newly joined side initiates toward each member it finds in the room;
/// members already present respond. An offer may outrace the `user-joined`
/// notice for its sender, so an offer from an unknown peer also creates a
/// responder link.
pub struct ParticipantSession {
    room: RoomId,
    local_id: Option<ParticipantId>,
    links: HashMap<ParticipantId, LinkHandle>,
    media: Option<Arc<LocalMedia>>,
    factory: Arc<dyn TransportFactory>,
    outbound: mpsc::Sender<SignalMessage>,
    inbound: mpsc::Receiver<SignalMessage>,
    link_events_tx: mpsc::UnboundedSender<LinkEvent>,
    link_events_rx: mpsc::UnboundedReceiver<LinkEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
}

impl ParticipantSession {
    /// Builds a session over an already established signaling channel.
    /// Returns the session (to be driven via [`ParticipantSession::run`]),
    /// the application handle and the event stream.
    pub fn new(
        room: RoomId,
        factory: Arc<dyn TransportFactory>,
        outbound: mpsc::Sender<SignalMessage>,
        inbound: mpsc::Receiver<SignalMessage>,
    ) -> (
        Self,
        SessionHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (link_events_tx, link_events_rx) = mpsc::unbounded_channel();

        let session = Self {
            room,
            local_id: None,
            links: HashMap::new(),
            media: None,
            factory,
            outbound,
            inbound,
            link_events_tx,
            link_events_rx,
            events: events_tx,
            cmd_rx,
        };

        (session, SessionHandle { cmd_tx }, events_rx)
    }

    /// Connects to a signaling server, spawns the session task and returns
    /// the handle and event stream.
    pub async fn connect(
        url: &str,
        room: RoomId,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let (client, inbound) = SignalingClient::connect(url).await?;
        let (session, handle, events) = Self::new(room, factory, client.sender(), inbound);
        tokio::spawn(session.run());
        Ok((handle, events))
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.inbound.recv() => match msg {
                    Some(msg) => self.handle_signal(msg).await,
                    None => {
                        info!("signaling connection closed");
                        self.shutdown().await;
                        return;
                    }
                },
                Some(evt) = self.link_events_rx.recv() => {
                    self.handle_link_event(evt).await;
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(SessionCommand::SetLocalMedia(media)) => {
                        self.set_local_media(media).await;
                    }
                    Some(SessionCommand::Leave) | None => {
                        self.shutdown().await;
                        return;
                    }
                },
            }
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Welcome { participant_id } => {
                info!(%participant_id, room = %self.room, "welcome, joining room");
                self.local_id = Some(participant_id.clone());
                self.send_signal(SignalMessage::Join {
                    room: self.room.clone(),
                })
                .await;
                self.emit(SessionEvent::Ready { participant_id });
            }
            SignalMessage::ExistingUsers { participants } => {
                for peer in participants {
                    self.ensure_link(peer, LinkRole::Initiator).await;
                }
            }
            SignalMessage::UserJoined { participant_id } => {
                self.ensure_link(participant_id, LinkRole::Responder).await;
            }
            SignalMessage::UserLeft { participant_id } => match self.links.remove(&participant_id)
            {
                Some(link) => {
                    link.close().await;
                    self.emit(SessionEvent::PeerLeft {
                        peer: participant_id,
                    });
                }
                None => debug!(peer = %participant_id, "user-left for unknown peer"),
            },
            SignalMessage::Offer { from, sdp, .. } => {
                // The offer may have outraced the user-joined notice.
                if let Some(link) = self.ensure_link(from, LinkRole::Responder).await {
                    link.send(LinkCommand::RemoteOffer(sdp)).await;
                }
            }
            SignalMessage::Answer { from, sdp, .. } => match self.links.get(&from) {
                Some(link) => link.send(LinkCommand::RemoteAnswer(sdp)).await,
                None => debug!(peer = %from, "dropping answer without a link"),
            },
            SignalMessage::IceCandidate {
                from, candidate, ..
            } => match self.links.get(&from) {
                Some(link) => link.send(LinkCommand::RemoteCandidate(candidate)).await,
                None => debug!(peer = %from, "dropping candidate without a link"),
            },
            other => debug!(?other, "ignoring server-bound message"),
        }
    }

    async fn handle_link_event(&mut self, evt: LinkEvent) {
        match evt {
            LinkEvent::Offer { peer, sdp } => self.send_envelope(peer, EnvelopeKind::Offer(sdp)).await,
            LinkEvent::Answer { peer, sdp } => {
                self.send_envelope(peer, EnvelopeKind::Answer(sdp)).await
            }
            LinkEvent::Candidate { peer, candidate } => {
                self.send_envelope(peer, EnvelopeKind::Candidate(candidate))
                    .await
            }
            LinkEvent::Connected { peer } => self.emit(SessionEvent::PeerConnected { peer }),
            LinkEvent::RemoteMedia { peer, media } => {
                self.emit(SessionEvent::PeerMedia { peer, media })
            }
            LinkEvent::Closed { peer, reason } => {
                // Absent means we already removed it on user-left.
                if self.links.remove(&peer).is_some() {
                    self.emit(SessionEvent::LinkClosed { peer, reason });
                }
            }
        }
    }

    async fn send_envelope(&mut self, peer: ParticipantId, kind: EnvelopeKind) {
        let Some(from) = self.local_id.clone() else {
            debug!(%peer, "no local identity yet, dropping outbound envelope");
            return;
        };
        let msg = match kind {
            EnvelopeKind::Offer(sdp) => SignalMessage::Offer {
                from,
                to: peer,
                sdp,
            },
            EnvelopeKind::Answer(sdp) => SignalMessage::Answer {
                from,
                to: peer,
                sdp,
            },
            EnvelopeKind::Candidate(candidate) => SignalMessage::IceCandidate {
                from,
                to: peer,
                candidate,
            },
        };
        self.send_signal(msg).await;
    }

    async fn ensure_link(
        &mut self,
        peer: ParticipantId,
        role: LinkRole,
    ) -> Option<&LinkHandle> {
        if !self.links.contains_key(&peer) {
            debug!(%peer, ?role, "creating link");
            match PeerLink::spawn(
                peer.clone(),
                role,
                self.factory.as_ref(),
                self.link_events_tx.clone(),
                self.media.clone(),
            )
            .await
            {
                Ok(handle) => {
                    self.links.insert(peer.clone(), handle);
                }
                Err(e) => {
                    warn!(%peer, "failed to create link: {e}");
                    return None;
                }
            }
        }
        self.links.get(&peer)
    }

    async fn set_local_media(&mut self, media: Arc<LocalMedia>) {
        if self.media.is_some() {
            warn!("local media already set");
            return;
        }
        self.media = Some(Arc::clone(&media));
        for link in self.links.values() {
            link.send(LinkCommand::AttachLocalMedia(Arc::clone(&media)))
                .await;
        }
    }

    /// Links first, then media, then (by returning) the signaling
    /// connection, so nothing transport-level outlives the session.
    async fn shutdown(&mut self) {
        for (_, link) in self.links.drain() {
            link.close().await;
        }
        self.media = None;
        self.emit(SessionEvent::Disconnected);
    }

    async fn send_signal(&mut self, msg: SignalMessage) {
        if self.outbound.send(msg).await.is_err() {
            debug!("signaling connection closed, dropping outbound message");
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("application stopped listening for session events");
        }
    }
}

enum EnvelopeKind {
    Offer(String),
    Answer(String),
    Candidate(String),
}
