//! End-to-end tests: a real listening server and real WebSocket clients
//! driving the full protocol, from room creation through the countdown
//! to the winner broadcast.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use keyrace::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port with a fast countdown and returns
/// its address.
async fn start_server() -> String {
    let server = KeyraceServerBuilder::new()
        .bind("127.0.0.1:0")
        .room_config(RoomConfig {
            countdown_interval: Duration::from_millis(25),
            ..RoomConfig::default()
        })
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
    ws
}

async fn send_msg(ws: &mut ClientWs, msg: &ClientMessage) {
    let bytes = serde_json::to_vec(msg).expect("encode");
    ws.send(Message::Binary(bytes.into()))
        .await
        .expect("send");
}

/// Receives the next data frame and decodes it as a [`ServerMessage`].
async fn recv_msg(ws: &mut ClientWs) -> ServerMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a server message")
            .expect("stream ended")
            .expect("recv failed");
        if msg.is_binary() || msg.is_text() {
            return serde_json::from_slice(&msg.into_data())
                .expect("decode server message");
        }
    }
}

/// Asserts that nothing arrives on this socket for the given window.
async fn assert_silence(ws: &mut ClientWs, window: Duration) {
    let result = tokio::time::timeout(window, ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

/// Creates a room for alice and returns her socket plus the room id
/// and passage.
async fn create_room(
    addr: &str,
    username: &str,
) -> (ClientWs, RoomId, String) {
    let mut ws = connect(addr).await;
    send_msg(
        &mut ws,
        &ClientMessage::CreateRoom {
            username: username.into(),
        },
    )
    .await;
    match recv_msg(&mut ws).await {
        ServerMessage::RoomCreated {
            room_id,
            text,
            username: echoed,
        } => {
            assert_eq!(echoed, username);
            (ws, room_id, text)
        }
        other => panic!("expected roomCreated, got {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_id_and_passage() {
    let addr = start_server().await;
    let (_ws, room_id, text) = create_room(&addr, "alice").await;

    assert_eq!(room_id.as_str().len(), 6);
    assert!(
        room_id.as_str().chars().all(|c| c.is_ascii_alphanumeric()),
        "room token should be printable: {room_id}"
    );
    assert!(!text.is_empty());
}

#[tokio::test]
async fn test_distinct_rooms_get_distinct_ids() {
    let addr = start_server().await;
    let (_ws1, r1, _) = create_room(&addr, "alice").await;
    let (_ws2, r2, _) = create_room(&addr, "bob").await;
    assert_ne!(r1, r2);
}

#[tokio::test]
async fn test_join_unknown_room_yields_error_msg() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send_msg(
        &mut ws,
        &ClientMessage::JoinRoom {
            room_id: RoomId::new("zzzzzz"),
            username: "bob".into(),
        },
    )
    .await;

    match recv_msg(&mut ws).await {
        ServerMessage::ErrorMsg { message } => {
            assert!(message.contains("not found"), "got: {message}");
        }
        other => panic!("expected errorMsg, got {other:?}"),
    }
}

#[tokio::test]
async fn test_joining_own_room_twice_is_rejected() {
    let addr = start_server().await;
    let (mut ws, room_id, _) = create_room(&addr, "alice").await;

    // The creator is already a player here; the same connection cannot
    // hold a second seat.
    send_msg(
        &mut ws,
        &ClientMessage::JoinRoom {
            room_id,
            username: "alice-two".into(),
        },
    )
    .await;

    match recv_msg(&mut ws).await {
        ServerMessage::ErrorMsg { message } => {
            assert!(message.contains("already joined"), "got: {message}");
        }
        other => panic!("expected errorMsg, got {other:?}"),
    }
}

#[tokio::test]
async fn test_solo_ready_never_starts_a_race() {
    let addr = start_server().await;
    let (mut ws, room_id, _) = create_room(&addr, "alice").await;

    send_msg(
        &mut ws,
        &ClientMessage::PlayerReady {
            room_id,
            username: "alice".into(),
        },
    )
    .await;

    match recv_msg(&mut ws).await {
        ServerMessage::PlayerReadyStatus {
            ready_players,
            total_players,
            ..
        } => {
            assert_eq!((ready_players, total_players), (1, 1));
        }
        other => panic!("expected playerReadyStatus, got {other:?}"),
    }

    // With a 25 ms countdown interval, 200 ms of silence means no
    // countdown ever armed.
    assert_silence(&mut ws, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_progress_before_start_is_dropped() {
    let addr = start_server().await;
    let (mut alice, room_id, _) = create_room(&addr, "alice").await;

    let mut bob = connect(&addr).await;
    send_msg(
        &mut bob,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            username: "bob".into(),
        },
    )
    .await;
    // Both see the roster broadcast.
    assert!(matches!(
        recv_msg(&mut alice).await,
        ServerMessage::StartGame { .. }
    ));
    assert!(matches!(
        recv_msg(&mut bob).await,
        ServerMessage::StartGame { .. }
    ));

    send_msg(
        &mut alice,
        &ClientMessage::ProgressUpdate {
            room_id,
            username: "alice".into(),
            progress: 0.2,
            wpm: 50.0,
            correct_chars: 30,
        },
    )
    .await;

    assert_silence(&mut bob, Duration::from_millis(150)).await;
}

#[tokio::test]
async fn test_full_race_scenario() {
    let addr = start_server().await;

    // --- Alice creates the room ---
    let (mut alice, room_id, text) = create_room(&addr, "alice").await;

    // --- Bob joins; both converge on the same roster and passage ---
    let mut bob = connect(&addr).await;
    send_msg(
        &mut bob,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            username: "bob".into(),
        },
    )
    .await;

    for ws in [&mut alice, &mut bob] {
        match recv_msg(ws).await {
            ServerMessage::StartGame {
                text: race_text,
                players,
            } => {
                assert_eq!(race_text, text);
                let names: Vec<&str> = players
                    .iter()
                    .map(|p| p.username.as_str())
                    .collect();
                assert_eq!(names, ["alice", "bob"]);
            }
            other => panic!("expected startGame, got {other:?}"),
        }
    }

    // --- Both ready up; the count climbs to 2/2 ---
    // Wait for each status before the next report so the counts are
    // deterministic across the two independent connections.
    send_msg(
        &mut alice,
        &ClientMessage::PlayerReady {
            room_id: room_id.clone(),
            username: "alice".into(),
        },
    )
    .await;
    for ws in [&mut alice, &mut bob] {
        match recv_msg(ws).await {
            ServerMessage::PlayerReadyStatus {
                username,
                ready,
                ready_players,
                total_players,
            } => {
                assert_eq!(username, "alice");
                assert!(ready);
                assert_eq!((ready_players, total_players), (1, 2));
            }
            other => panic!("expected playerReadyStatus, got {other:?}"),
        }
    }

    send_msg(
        &mut bob,
        &ClientMessage::PlayerReady {
            room_id: room_id.clone(),
            username: "bob".into(),
        },
    )
    .await;
    for ws in [&mut alice, &mut bob] {
        match recv_msg(ws).await {
            ServerMessage::PlayerReadyStatus {
                username,
                ready_players,
                total_players,
                ..
            } => {
                assert_eq!(username, "bob");
                assert_eq!((ready_players, total_players), (2, 2));
            }
            other => panic!("expected playerReadyStatus, got {other:?}"),
        }
    }

    // --- Countdown 3, 2, 1, 0, then raceStart ---
    for ws in [&mut alice, &mut bob] {
        for expected in [3u8, 2, 1, 0] {
            match recv_msg(ws).await {
                ServerMessage::Countdown { value } => {
                    assert_eq!(value, expected);
                }
                other => panic!("expected countdown, got {other:?}"),
            }
        }
        assert!(matches!(
            recv_msg(ws).await,
            ServerMessage::RaceStart
        ));
    }

    // --- Progress relays to the opponent, not back to the sender ---
    send_msg(
        &mut alice,
        &ClientMessage::ProgressUpdate {
            room_id: room_id.clone(),
            username: "alice".into(),
            progress: 0.5,
            wpm: 82.0,
            correct_chars: 120,
        },
    )
    .await;

    match recv_msg(&mut bob).await {
        ServerMessage::OpponentProgress {
            username,
            progress,
            ..
        } => {
            assert_eq!(username, "alice");
            assert_eq!(progress, 0.5);
        }
        other => panic!("expected opponentProgress, got {other:?}"),
    }
    assert_silence(&mut alice, Duration::from_millis(100)).await;

    // --- Alice finishes first and wins; Bob's finish changes nothing ---
    send_msg(
        &mut alice,
        &ClientMessage::FinishedGame {
            room_id: room_id.clone(),
            username: "alice".into(),
            wpm: 80.0,
        },
    )
    .await;

    for ws in [&mut alice, &mut bob] {
        match recv_msg(ws).await {
            ServerMessage::GameOver { winner, wpm } => {
                assert_eq!(winner, "alice");
                assert_eq!(wpm, 80.0);
            }
            other => panic!("expected gameOver, got {other:?}"),
        }
    }

    send_msg(
        &mut bob,
        &ClientMessage::FinishedGame {
            room_id,
            username: "bob".into(),
            wpm: 95.0,
        },
    )
    .await;

    assert_silence(&mut alice, Duration::from_millis(150)).await;
    assert_silence(&mut bob, Duration::from_millis(150)).await;
}

#[tokio::test]
async fn test_disconnect_notifies_room_and_frees_it_when_empty() {
    let addr = start_server().await;
    let (alice, room_id, _) = create_room(&addr, "alice").await;

    let mut bob = connect(&addr).await;
    send_msg(
        &mut bob,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            username: "bob".into(),
        },
    )
    .await;
    assert!(matches!(
        recv_msg(&mut bob).await,
        ServerMessage::StartGame { .. }
    ));

    // Alice drops; Bob hears about it and the room survives.
    drop(alice);
    match recv_msg(&mut bob).await {
        ServerMessage::PlayerDisconnected { username } => {
            assert_eq!(username, "alice");
        }
        other => panic!("expected playerDisconnected, got {other:?}"),
    }

    // Bob drops too; the now-empty room is deleted.
    drop(bob);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut carol = connect(&addr).await;
    send_msg(
        &mut carol,
        &ClientMessage::JoinRoom {
            room_id,
            username: "carol".into(),
        },
    )
    .await;
    match recv_msg(&mut carol).await {
        ServerMessage::ErrorMsg { message } => {
            assert!(message.contains("not found"), "got: {message}");
        }
        other => panic!("expected errorMsg, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_frames_are_skipped() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    // Garbage first; the connection must survive it.
    ws.send(Message::Binary(b"not json".to_vec().into()))
        .await
        .expect("send");

    send_msg(
        &mut ws,
        &ClientMessage::CreateRoom {
            username: "alice".into(),
        },
    )
    .await;
    assert!(matches!(
        recv_msg(&mut ws).await,
        ServerMessage::RoomCreated { .. }
    ));
}
