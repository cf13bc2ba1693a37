use conclave_core::{ParticipantId, RoomId, SignalMessage};

use crate::utils::{connect_client, init_tracing, next_signal, send_signal, spawn_server};

async fn welcome_id(ws: &mut crate::utils::WsClient) -> ParticipantId {
    match next_signal(ws).await {
        SignalMessage::Welcome { participant_id } => participant_id,
        other => panic!("expected welcome, got {other:?}"),
    }
}

#[tokio::test]
async fn two_clients_signal_through_a_room() {
    init_tracing();

    let addr = spawn_server().await;
    let room = RoomId::from("abc");

    let mut c1 = connect_client(addr).await;
    let p1 = welcome_id(&mut c1).await;
    send_signal(&mut c1, &SignalMessage::Join { room: room.clone() }).await;
    match next_signal(&mut c1).await {
        SignalMessage::ExistingUsers { participants } => assert!(participants.is_empty()),
        other => panic!("expected existing-users, got {other:?}"),
    }

    let mut c2 = connect_client(addr).await;
    let p2 = welcome_id(&mut c2).await;
    send_signal(&mut c2, &SignalMessage::Join { room: room.clone() }).await;
    match next_signal(&mut c2).await {
        SignalMessage::ExistingUsers { participants } => {
            assert_eq!(participants, vec![p1.clone()]);
        }
        other => panic!("expected existing-users, got {other:?}"),
    }
    match next_signal(&mut c1).await {
        SignalMessage::UserJoined { participant_id } => assert_eq!(participant_id, p2),
        other => panic!("expected user-joined, got {other:?}"),
    }

    // The newcomer offers to the member it found; the relay stamps `from`.
    send_signal(
        &mut c2,
        &SignalMessage::Offer {
            from: p2.clone(),
            to: p1.clone(),
            sdp: "offer-sdp".into(),
        },
    )
    .await;
    match next_signal(&mut c1).await {
        SignalMessage::Offer { from, to, sdp } => {
            assert_eq!(from, p2);
            assert_eq!(to, p1);
            assert_eq!(sdp, "offer-sdp");
        }
        other => panic!("expected offer, got {other:?}"),
    }

    send_signal(
        &mut c1,
        &SignalMessage::Answer {
            from: p1.clone(),
            to: p2.clone(),
            sdp: "answer-sdp".into(),
        },
    )
    .await;
    match next_signal(&mut c2).await {
        SignalMessage::Answer { from, sdp, .. } => {
            assert_eq!(from, p1);
            assert_eq!(sdp, "answer-sdp");
        }
        other => panic!("expected answer, got {other:?}"),
    }
}

#[tokio::test]
async fn disconnect_fans_out_user_left() {
    init_tracing();

    let addr = spawn_server().await;
    let room = RoomId::from("abc");

    let mut c1 = connect_client(addr).await;
    welcome_id(&mut c1).await;
    send_signal(&mut c1, &SignalMessage::Join { room: room.clone() }).await;
    next_signal(&mut c1).await; // existing-users

    let mut c2 = connect_client(addr).await;
    let p2 = welcome_id(&mut c2).await;
    send_signal(&mut c2, &SignalMessage::Join { room: room.clone() }).await;
    next_signal(&mut c2).await; // existing-users
    next_signal(&mut c1).await; // user-joined

    c2.close(None).await.expect("close client 2");

    match next_signal(&mut c1).await {
        SignalMessage::UserLeft { participant_id } => assert_eq!(participant_id, p2),
        other => panic!("expected user-left, got {other:?}"),
    }
}
