use conclave_core::{ParticipantId, SignalMessage};

use crate::utils::{TestPeer, init_tracing, make_relay};

#[tokio::test]
async fn route_rewrites_from_and_keeps_payload_verbatim() {
    init_tracing();

    let relay = make_relay();
    let mut sender = TestPeer::register(&relay);
    let mut target = TestPeer::register(&relay);

    // A client could claim any `from`; the relay must stamp the real one.
    let forged = ParticipantId::new();
    relay.route(
        &sender.id,
        SignalMessage::Offer {
            from: forged,
            to: target.id.clone(),
            sdp: "v=0 payload untouched".into(),
        },
    );

    match target.expect().await {
        SignalMessage::Offer { from, to, sdp } => {
            assert_eq!(from, sender.id);
            assert_eq!(to, target.id);
            assert_eq!(sdp, "v=0 payload untouched");
        }
        other => panic!("expected offer, got {other:?}"),
    }
    assert!(sender.silent().await, "routing must not echo to the sender");
}

#[tokio::test]
async fn route_to_disconnected_target_is_silently_dropped() {
    init_tracing();

    let relay = make_relay();
    let mut sender = TestPeer::register(&relay);
    let ghost = ParticipantId::new();

    relay.route(
        &sender.id,
        SignalMessage::IceCandidate {
            from: sender.id.clone(),
            to: ghost,
            candidate: "candidate:0".into(),
        },
    );

    // No error reaches the sender; the envelope simply vanishes.
    assert!(sender.silent().await);
}

#[tokio::test]
async fn unregistered_peer_stops_receiving() {
    init_tracing();

    let relay = make_relay();
    let mut sender = TestPeer::register(&relay);
    let mut target = TestPeer::register(&relay);

    relay.unregister(&target.id);
    relay.route(
        &sender.id,
        SignalMessage::Answer {
            from: sender.id.clone(),
            to: target.id.clone(),
            sdp: "late".into(),
        },
    );

    assert!(target.silent().await);
}
