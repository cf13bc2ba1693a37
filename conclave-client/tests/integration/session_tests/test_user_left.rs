use std::sync::Arc;
use std::time::Duration;

use conclave_client::media::LocalMedia;
use conclave_client::session::SessionEvent;
use conclave_core::{ParticipantId, SignalMessage};

use crate::integration::session_tests::start_session;
use crate::utils::{MockTransportFactory, init_tracing, recv_timeout, recv_unbounded};

#[tokio::test]
async fn user_left_tears_down_one_link_and_leaves_the_rest() {
    init_tracing();

    let factory = MockTransportFactory::new();
    let mut session = start_session(factory.clone());

    let me = ParticipantId::new();
    let p1 = ParticipantId::new();
    let p2 = ParticipantId::new();

    session
        .inbound
        .send(SignalMessage::Welcome {
            participant_id: me.clone(),
        })
        .await
        .unwrap();
    session
        .handle
        .set_local_media(Arc::new(LocalMedia::new("local")))
        .await;
    session
        .inbound
        .send(SignalMessage::ExistingUsers {
            participants: vec![p1.clone(), p2.clone()],
        })
        .await
        .unwrap();

    // Both links are up and offering before anyone leaves. Links are
    // created in enumeration order, so transport 0 belongs to p1.
    let mut offers = 0;
    while offers < 2 {
        match recv_timeout(&mut session.outbound, 2000).await {
            Some(SignalMessage::Offer { .. }) => offers += 1,
            Some(SignalMessage::Join { .. }) => continue,
            other => panic!("expected offer, got {other:?}"),
        }
    }

    session
        .inbound
        .send(SignalMessage::UserLeft {
            participant_id: p1.clone(),
        })
        .await
        .unwrap();

    let left = loop {
        match recv_unbounded(&mut session.events, 1000).await {
            Some(SessionEvent::PeerLeft { peer }) => break peer,
            Some(_) => continue,
            None => panic!("no peer-left event"),
        }
    };
    assert_eq!(left, p1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(factory.transport(0).await.close_count().await, 1);
    assert_eq!(factory.transport(1).await.close_count().await, 0);

    // The surviving link still negotiates.
    session
        .inbound
        .send(SignalMessage::Answer {
            from: p2.clone(),
            to: me,
            sdp: "answer-sdp".into(),
        })
        .await
        .unwrap();
    let connected = loop {
        match recv_unbounded(&mut session.events, 1000).await {
            Some(SessionEvent::PeerConnected { peer }) => break peer,
            Some(_) => continue,
            None => panic!("no peer-connected event"),
        }
    };
    assert_eq!(connected, p2);
}
