mod test_user_left;

use std::sync::Arc;

use conclave_client::session::{ParticipantSession, SessionEvent, SessionHandle};
use conclave_client::transport::TransportFactory;
use conclave_core::{RoomId, SignalMessage};
use tokio::sync::mpsc;

/// A session wired to in-memory signaling channels instead of a live
/// websocket: the test plays the server by feeding `inbound` and reading
/// `outbound`.
pub struct TestSession {
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub inbound: mpsc::Sender<SignalMessage>,
    pub outbound: mpsc::Receiver<SignalMessage>,
}

pub fn start_session(factory: Arc<dyn TransportFactory>) -> TestSession {
    let (out_tx, out_rx) = mpsc::channel(64);
    let (in_tx, in_rx) = mpsc::channel(64);
    let (session, handle, events) =
        ParticipantSession::new(RoomId::from("test-room"), factory, out_tx, in_rx);
    tokio::spawn(session.run());
    TestSession {
        handle,
        events,
        inbound: in_tx,
        outbound: out_rx,
    }
}
