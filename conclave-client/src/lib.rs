pub mod error;
pub mod link;
pub mod media;
pub mod session;
pub mod signaling;
pub mod transport;

pub use error::{SessionError, SignalingError, TransportError};
pub use link::{LinkCommand, LinkEvent, LinkHandle, LinkState, PeerLink};
pub use media::{LocalMedia, MediaKind, RemoteMedia};
pub use session::{ParticipantSession, SessionCommand, SessionEvent, SessionHandle};
pub use signaling::SignalingClient;
pub use transport::{
    PeerTransport, RtcConfig, RtcTransport, RtcTransportFactory, SdpKind, TransportEvent,
    TransportFactory,
};
