use std::sync::Arc;

use conclave_client::link::{LinkCommand, LinkEvent, LinkState, PeerLink};
use conclave_client::media::LocalMedia;
use conclave_client::transport::TransportEvent;
use conclave_core::{LinkRole, ParticipantId};
use tokio::sync::mpsc;

use crate::utils::{MockTransportFactory, init_tracing, recv_unbounded, wait_for_state};

#[tokio::test]
async fn candidate_rejection_closes_the_link_with_a_reason() {
    init_tracing();

    let factory = MockTransportFactory::passive();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let peer = ParticipantId::new();
    let media = Arc::new(LocalMedia::new("local"));

    let link = PeerLink::spawn(
        peer.clone(),
        LinkRole::Responder,
        factory.as_ref(),
        events_tx,
        Some(media),
    )
    .await
    .expect("spawn link");

    assert!(wait_for_state(&link, LinkState::AwaitingOffer, 1000).await);

    link.send(LinkCommand::RemoteOffer("remote-offer".into()))
        .await;
    assert!(wait_for_state(&link, LinkState::Connected, 1000).await);

    factory.transport(0).await.fail_on("add_ice_candidate").await;
    link.send(LinkCommand::RemoteCandidate("poison".into())).await;

    assert!(wait_for_state(&link, LinkState::Closed, 1000).await);
    let reason = loop {
        match recv_unbounded(&mut events_rx, 1000).await {
            Some(LinkEvent::Closed { reason, .. }) => break reason,
            Some(_) => continue,
            None => panic!("no closed event"),
        }
    };
    assert!(reason.is_some());
}

#[tokio::test]
async fn transport_disconnect_closes_the_link() {
    init_tracing();

    let factory = MockTransportFactory::passive();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let media = Arc::new(LocalMedia::new("local"));

    let link = PeerLink::spawn(
        ParticipantId::new(),
        LinkRole::Initiator,
        factory.as_ref(),
        events_tx,
        Some(media),
    )
    .await
    .expect("spawn link");

    assert!(wait_for_state(&link, LinkState::NegotiatingOffer, 1000).await);

    factory
        .transport(0)
        .await
        .inject(TransportEvent::Disconnected)
        .await;

    assert!(wait_for_state(&link, LinkState::Closed, 1000).await);
    let closed = loop {
        match recv_unbounded(&mut events_rx, 1000).await {
            Some(LinkEvent::Closed { .. }) => break true,
            Some(_) => continue,
            None => break false,
        }
    };
    assert!(closed);
}
