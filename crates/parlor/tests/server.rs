//! Integration tests for the Parlor server: the full wire-level flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
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
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn encode_command(command: &ClientCommand) -> Message {
    Message::text(serde_json::to_string(command).expect("encode"))
}

/// Receives the next data frame as raw JSON text.
async fn next_text(ws: &mut ClientWs) -> String {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("recv failed");
        match msg {
            Message::Text(text) => return text.as_str().to_string(),
            Message::Binary(data) => {
                return String::from_utf8(data.to_vec()).expect("utf8")
            }
            _ => continue, // ping/pong
        }
    }
}

/// Receives and decodes the next server event.
async fn next_event(ws: &mut ClientWs) -> ServerEvent {
    let text = next_text(ws).await;
    serde_json::from_str(&text).expect("decode event")
}

/// Asserts that nothing arrives on `ws` for a short window.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

/// Creates a room and returns its code.
async fn create_room(ws: &mut ClientWs) -> RoomCode {
    ws.send(encode_command(&ClientCommand::CreateRoom {
        host_id: "client-chosen".into(),
    }))
    .await
    .expect("send create");
    match next_event(ws).await {
        ServerEvent::RoomCreated { code } => code,
        other => panic!("expected RoomCreated, got {other:?}"),
    }
}

/// Joins a room and returns the assigned player id and the reply roster.
async fn join_room(ws: &mut ClientWs, code: &RoomCode, name: &str) -> (ConnectionId, Room) {
    ws.send(encode_command(&ClientCommand::JoinRoom {
        code: code.clone(),
        name: name.into(),
    }))
    .await
    .expect("send join");
    match next_event(ws).await {
        ServerEvent::RoomJoined { player_id, state } => (player_id, state),
        other => panic!("expected RoomJoined, got {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_a_code() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;

    let code = create_room(&mut host).await;

    assert_eq!(code.as_str().len(), 6);
    assert!(
        code.as_str()
            .chars()
            .all(|c| "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".contains(c)),
        "unexpected character in {code}"
    );
}

#[tokio::test]
async fn test_join_reaches_joiner_and_host() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;

    let mut player = connect(&addr).await;
    let (player_id, state) = join_room(&mut player, &code, "Alice").await;

    assert_eq!(state.code, code);
    assert_eq!(state.status, RoomStatus::Waiting);
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.players[0].name, "Alice");
    assert_eq!(state.players[0].id, player_id, "reply id must match the roster");

    // The joiner hears the roster broadcast after the reply.
    match next_event(&mut player).await {
        ServerEvent::StateUpdate { state, event } => {
            assert_eq!(event, None);
            assert_eq!(state.players.len(), 1);
        }
        other => panic!("expected StateUpdate, got {other:?}"),
    }

    // So does the host.
    match next_event(&mut host).await {
        ServerEvent::StateUpdate { state, .. } => {
            assert_eq!(state.players[0].name, "Alice");
        }
        other => panic!("expected StateUpdate, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_accepts_lowercase_codes() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;

    let raw = serde_json::json!({
        "event": "room:join",
        "data": { "code": code.as_str().to_lowercase(), "name": "Alice" },
    });
    let mut player = connect(&addr).await;
    player
        .send(Message::text(raw.to_string()))
        .await
        .expect("send join");

    match next_event(&mut player).await {
        ServerEvent::RoomJoined { state, .. } => {
            assert_eq!(state.code, code, "code must come back uppercase");
        }
        other => panic!("expected RoomJoined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room_errors_the_requester_only() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let _code = create_room(&mut host).await;

    let mut player = connect(&addr).await;
    player
        .send(encode_command(&ClientCommand::JoinRoom {
            code: RoomCode::new("ZZZZZZ"),
            name: "Zed".into(),
        }))
        .await
        .expect("send join");

    match next_event(&mut player).await {
        ServerEvent::Error { message } => {
            assert_eq!(message, "room ZZZZZZ not found");
        }
        other => panic!("expected Error, got {other:?}"),
    }
    assert_silent(&mut host).await;
}

#[tokio::test]
async fn test_start_quiz_broadcasts_to_the_whole_room() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;
    let mut player = connect(&addr).await;
    join_room(&mut player, &code, "Alice").await;
    let _ = next_event(&mut player).await; // roster broadcast
    let _ = next_event(&mut host).await;

    host.send(encode_command(&ClientCommand::StartQuiz { code }))
        .await
        .expect("send start");

    for ws in [&mut host, &mut player] {
        match next_event(ws).await {
            ServerEvent::StateUpdate { state, event } => {
                assert_eq!(state.status, RoomStatus::Active);
                assert_eq!(event, Some(StateMarker::QuizStarted));
            }
            other => panic!("expected StateUpdate, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_start_quiz_by_non_host_is_rejected() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;
    let mut player = connect(&addr).await;
    join_room(&mut player, &code, "Alice").await;
    let _ = next_event(&mut player).await;
    let _ = next_event(&mut host).await;

    player
        .send(encode_command(&ClientCommand::StartQuiz { code }))
        .await
        .expect("send start");

    match next_event(&mut player).await {
        ServerEvent::Error { message } => {
            assert_eq!(message, "only the host may do that");
        }
        other => panic!("expected Error, got {other:?}"),
    }
    assert_silent(&mut host).await;
}

#[tokio::test]
async fn test_disconnect_broadcasts_the_remaining_roster() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;
    let mut player = connect(&addr).await;
    join_room(&mut player, &code, "Alice").await;
    let _ = next_event(&mut host).await;

    player.close(None).await.expect("close");

    match next_event(&mut host).await {
        ServerEvent::StateUpdate { state, event } => {
            assert!(state.players.is_empty(), "roster must drop the leaver");
            assert_eq!(state.status, RoomStatus::Waiting);
            assert_eq!(event, None);
        }
        other => panic!("expected StateUpdate, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_payload_draws_an_error_and_the_connection_survives() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json")).await.expect("send");
    match next_event(&mut ws).await {
        ServerEvent::Error { message } => {
            assert_eq!(message, "unrecognized command");
        }
        other => panic!("expected Error, got {other:?}"),
    }

    // The same connection can still do real work.
    let code = create_room(&mut ws).await;
    assert_eq!(code.as_str().len(), 6);
}

#[tokio::test]
async fn test_unknown_event_name_draws_an_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let raw = serde_json::json!({ "event": "bogus:thing", "data": {} });
    ws.send(Message::text(raw.to_string())).await.expect("send");

    assert!(matches!(
        next_event(&mut ws).await,
        ServerEvent::Error { .. }
    ));
}

#[tokio::test]
async fn test_binary_frames_are_accepted() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let command = ClientCommand::CreateRoom {
        host_id: "host".into(),
    };
    let bytes = serde_json::to_vec(&command).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");

    assert!(matches!(
        next_event(&mut ws).await,
        ServerEvent::RoomCreated { .. }
    ));
}

#[tokio::test]
async fn test_rooms_are_independent() {
    let addr = start_server().await;
    let mut host_a = connect(&addr).await;
    let mut host_b = connect(&addr).await;
    let code_a = create_room(&mut host_a).await;
    let code_b = create_room(&mut host_b).await;
    assert_ne!(code_a, code_b);

    let mut player = connect(&addr).await;
    join_room(&mut player, &code_a, "Alice").await;

    match next_event(&mut host_a).await {
        ServerEvent::StateUpdate { state, .. } => assert_eq!(state.code, code_a),
        other => panic!("expected StateUpdate, got {other:?}"),
    }
    assert_silent(&mut host_b).await;
}

#[tokio::test]
async fn test_answer_submit_is_accepted_silently() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;
    let mut player = connect(&addr).await;
    join_room(&mut player, &code, "Alice").await;
    let _ = next_event(&mut player).await;
    let _ = next_event(&mut host).await;
    host.send(encode_command(&ClientCommand::StartQuiz { code }))
        .await
        .expect("send start");
    let _ = next_event(&mut player).await;
    let _ = next_event(&mut host).await;

    player
        .send(encode_command(&ClientCommand::SubmitAnswer {
            question_id: "q1".into(),
            answer: serde_json::json!(2),
        }))
        .await
        .expect("send answer");

    assert_silent(&mut player).await;
    assert_silent(&mut host).await;
}

#[tokio::test]
async fn test_state_update_wire_shape() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host).await;
    let mut player = connect(&addr).await;
    join_room(&mut player, &code, "Alice").await;

    // The roster broadcast, as raw JSON.
    let text = next_text(&mut host).await;
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["event"], "state:update");
    assert_eq!(value["data"]["state"]["code"], code.as_str());
    assert!(value["data"]["state"]["hostId"].is_string());
    assert_eq!(value["data"]["state"]["players"][0]["name"], "Alice");
    assert_eq!(value["data"]["state"]["status"], "waiting");
    assert!(
        value["data"].get("event").is_none(),
        "no marker on a plain roster update"
    );

    // The start broadcast carries the started marker.
    host.send(encode_command(&ClientCommand::StartQuiz { code }))
        .await
        .expect("send start");
    let text = next_text(&mut host).await;
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["event"], "state:update");
    assert_eq!(value["data"]["state"]["status"], "active");
    assert_eq!(value["data"]["event"], "quiz:started");
}
