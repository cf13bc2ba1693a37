use std::sync::Arc;
use std::time::Duration;

use conclave_client::link::{LinkCommand, LinkEvent, LinkState, PeerLink};
use conclave_client::media::LocalMedia;
use conclave_client::transport::SdpKind;
use conclave_core::{LinkRole, ParticipantId};
use tokio::sync::mpsc;

use crate::utils::{
    MockTransportFactory, TransportCall, init_tracing, recv_unbounded, wait_for_state,
};

#[tokio::test]
async fn responder_answers_and_replays_buffered_candidates_in_order() {
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

    // Candidates race ahead of the offer; they must wait for it.
    link.send(LinkCommand::RemoteCandidate("candidate-1".into()))
        .await;
    link.send(LinkCommand::RemoteCandidate("candidate-2".into()))
        .await;
    link.send(LinkCommand::RemoteOffer("remote-offer".into()))
        .await;

    let sdp = loop {
        match recv_unbounded(&mut events_rx, 1000).await {
            Some(LinkEvent::Answer { sdp, .. }) => break sdp,
            Some(_) => continue,
            None => panic!("no answer produced"),
        }
    };
    assert_eq!(sdp, "mock-answer");
    assert!(wait_for_state(&link, LinkState::Connected, 1000).await);

    let calls = factory.transport(0).await.calls().await;
    assert_eq!(
        calls,
        vec![
            TransportCall::AttachMedia,
            TransportCall::SetRemoteDescription(SdpKind::Offer, "remote-offer".into()),
            TransportCall::AddIceCandidate("candidate-1".into()),
            TransportCall::AddIceCandidate("candidate-2".into()),
            TransportCall::CreateAnswer,
        ]
    );
}

#[tokio::test]
async fn offer_before_media_is_answered_after_attachment() {
    init_tracing();

    let factory = MockTransportFactory::passive();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let peer = ParticipantId::new();

    let link = PeerLink::spawn(
        peer,
        LinkRole::Responder,
        factory.as_ref(),
        events_tx,
        None,
    )
    .await
    .expect("spawn link");

    assert!(wait_for_state(&link, LinkState::AwaitingLocalMedia, 1000).await);

    // The remote offer arrives while local media acquisition is pending.
    // It is queued, not rejected and not answered.
    link.send(LinkCommand::RemoteOffer("remote-offer".into()))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(factory.transport(0).await.calls().await.is_empty());
    assert_eq!(link.state(), LinkState::AwaitingLocalMedia);

    link.send(LinkCommand::AttachLocalMedia(Arc::new(LocalMedia::new(
        "local",
    ))))
    .await;

    let answered = loop {
        match recv_unbounded(&mut events_rx, 1000).await {
            Some(LinkEvent::Answer { .. }) => break true,
            Some(_) => continue,
            None => break false,
        }
    };
    assert!(answered, "queued offer must be answered once media attaches");
    assert!(wait_for_state(&link, LinkState::Connected, 1000).await);
}
