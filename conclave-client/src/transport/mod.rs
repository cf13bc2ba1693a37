use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::media::{LocalMedia, RemoteMedia};

mod rtc;

pub use rtc::{RtcConfig, RtcTransport, RtcTransportFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Push-driven notifications from a transport, delivered at the transport's
/// own pace through the channel given at construction.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local connectivity candidate to forward to the remote peer.
    CandidateGenerated(String),
    /// Media attachment changed the connection's requirements; the initiator
    /// should produce a fresh offer.
    NegotiationNeeded,
    /// The remote peer's media started arriving.
    RemoteMedia(RemoteMedia),
    /// The underlying connection failed or was closed remotely.
    Disconnected,
}

/// The point-to-point connection primitive a link negotiates over.
///
/// `create_offer`/`create_answer` also apply the produced description
/// locally. Implementations report their asynchronous side (candidates,
/// renegotiation requests, remote media, failure) through [`TransportEvent`]s.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn attach_media(&self, media: Arc<LocalMedia>) -> Result<(), TransportError>;

    async fn create_offer(&self) -> Result<String, TransportError>;

    async fn create_answer(&self) -> Result<String, TransportError>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String)
    -> Result<(), TransportError>;

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Creates one transport per remote peer; each link owns its own.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError>;
}
