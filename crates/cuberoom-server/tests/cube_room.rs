//! End-to-end tests: real WebSocket clients against a cube room server.

use std::time::Duration;

use cuberoom::prelude::*;
use cuberoom_server::{CubeRoom, health};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

async fn start_server() -> String {
    let server = CuberoomServerBuilder::new()
        .bind("127.0.0.1:0")
        .room_name("my_room")
        .build::<CubeRoom>()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn send(ws: &mut ClientWs, payload: Payload) {
    let env = Envelope {
        seq: 0,
        timestamp: 0,
        channel: Channel::ReliableOrdered,
        payload,
    };
    let bytes = serde_json::to_vec(&env).expect("encode");
    ws.send(Message::Binary(bytes.into())).await.expect("send");
}

async fn send_game(ws: &mut ClientWs, msg: Value) {
    send(ws, Payload::Game(serde_json::to_vec(&msg).unwrap())).await;
}

async fn recv(ws: &mut ClientWs) -> Payload {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended")
        .expect("recv");
    let env: Envelope = serde_json::from_slice(&msg.into_data()).expect("decode");
    env.payload
}

/// Next game message, as loose JSON.
async fn recv_game(ws: &mut ClientWs) -> Value {
    match recv(ws).await {
        Payload::Game(data) => serde_json::from_slice(&data).expect("game json"),
        other => panic!("expected game message, got {other:?}"),
    }
}

async fn expect_silence(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "unexpected message: {result:?}");
}

/// Connects and joins the shared room. Returns the socket, the session
/// id, and the `existingPlayers` snapshot it was greeted with.
async fn join(addr: &str, options: Value) -> (ClientWs, String, Value) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("connect");

    send(
        &mut ws,
        Payload::System(SystemMessage::Handshake {
            version: PROTOCOL_VERSION,
        }),
    )
    .await;
    let sid = match recv(&mut ws).await {
        Payload::System(SystemMessage::HandshakeAck { session_id, .. }) => {
            session_id.to_string()
        }
        other => panic!("expected HandshakeAck, got {other:?}"),
    };

    send(
        &mut ws,
        Payload::System(SystemMessage::JoinOrCreate {
            name: "my_room".into(),
            options: serde_json::to_vec(&options).unwrap(),
        }),
    )
    .await;
    match recv(&mut ws).await {
        Payload::System(SystemMessage::RoomJoined { .. }) => {}
        other => panic!("expected RoomJoined, got {other:?}"),
    }

    let snapshot = recv_game(&mut ws).await;
    assert_eq!(snapshot["type"], "existingPlayers");
    (ws, sid, snapshot)
}

fn spawn_record(sid: &str) -> Value {
    json!({ "sessionId": sid, "x": 0.0, "y": 0.0, "z": 0.0, "rx": 0.0, "ry": 0.0, "rz": 0.0 })
}

// =========================================================================
// Join
// =========================================================================

#[tokio::test]
async fn test_first_joiner_sees_empty_room() {
    let addr = start_server().await;
    let (mut a, _, snapshot) = join(&addr, json!({})).await;

    assert_eq!(snapshot, json!({ "type": "existingPlayers", "players": [] }));
    expect_silence(&mut a).await;
}

#[tokio::test]
async fn test_second_joiner_sees_first_and_first_is_told() {
    let addr = start_server().await;
    let (mut a, sid_a, _) = join(&addr, json!({})).await;
    let (_b, sid_b, snapshot) = join(&addr, json!({})).await;

    assert_eq!(snapshot["players"], json!([spawn_record(&sid_a)]));
    assert_eq!(
        recv_game(&mut a).await,
        json!({ "type": "playerJoined", "sid": sid_b })
    );
}

#[tokio::test]
async fn test_joiner_not_told_about_itself() {
    let addr = start_server().await;
    let (_a, _, _) = join(&addr, json!({})).await;
    let (mut b, sid_b, snapshot) = join(&addr, json!({})).await;

    let players = snapshot["players"].as_array().unwrap();
    assert!(players.iter().all(|p| p["sessionId"] != sid_b.as_str()));
    expect_silence(&mut b).await;
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_player_move_scenario() {
    let addr = start_server().await;
    let (mut a, sid_a, _) = join(&addr, json!({})).await;
    let (mut b, sid_b, _) = join(&addr, json!({})).await;
    recv_game(&mut a).await; // playerJoined B

    send_game(
        &mut a,
        json!({ "type": "playerMove", "x": 1, "y": 2, "z": 3, "rx": 0, "ry": 0, "rz": 0 }),
    )
    .await;
    assert_eq!(
        recv_game(&mut b).await,
        json!({
            "type": "remotePlayerMove", "sid": sid_a,
            "x": 1.0, "y": 2.0, "z": 3.0, "rx": 0.0, "ry": 0.0, "rz": 0.0
        })
    );

    send_game(&mut b, json!({ "type": "playerMove", "x": 10 })).await;
    assert_eq!(
        recv_game(&mut a).await,
        json!({ "type": "remotePlayerMove", "sid": sid_b, "x": 10.0 })
    );

    expect_silence(&mut a).await;
    expect_silence(&mut b).await;

    // A third joiner sees the merged records.
    let (_c, _, snapshot) = join(&addr, json!({})).await;
    let mut players = snapshot["players"].as_array().unwrap().clone();
    players.sort_by(|p, q| p["sessionId"].as_str().cmp(&q["sessionId"].as_str()));
    let mut expected = vec![
        json!({ "sessionId": sid_a, "x": 1.0, "y": 2.0, "z": 3.0, "rx": 0.0, "ry": 0.0, "rz": 0.0 }),
        json!({ "sessionId": sid_b, "x": 10.0, "y": 0.0, "z": 0.0, "rx": 0.0, "ry": 0.0, "rz": 0.0 }),
    ];
    expected.sort_by(|p, q| p["sessionId"].as_str().cmp(&q["sessionId"].as_str()));
    assert_eq!(players, expected);
}

#[tokio::test]
async fn test_move_with_bad_field_still_relays_the_rest() {
    let addr = start_server().await;
    let (mut a, sid_a, _) = join(&addr, json!({})).await;
    let (mut b, _, _) = join(&addr, json!({})).await;
    recv_game(&mut a).await; // playerJoined B

    send_game(&mut a, json!({ "type": "playerMove", "x": "oops", "y": 2 })).await;

    assert_eq!(
        recv_game(&mut b).await,
        json!({ "type": "remotePlayerMove", "sid": sid_a, "y": 2.0 })
    );
    expect_silence(&mut a).await;

    let (_c, _, snapshot) = join(&addr, json!({})).await;
    let players = snapshot["players"].as_array().unwrap();
    let record = players
        .iter()
        .find(|p| p["sessionId"] == sid_a.as_str())
        .expect("A's record");
    assert_eq!(record["x"], 0.0);
    assert_eq!(record["y"], 2.0);
}

#[tokio::test]
async fn test_move_cube_relayed_to_others_only() {
    let addr = start_server().await;
    let (mut a, sid_a, _) = join(&addr, json!({})).await;
    let (mut b, _, _) = join(&addr, json!({})).await;
    let (mut c, _, _) = join(&addr, json!({})).await;
    recv_game(&mut a).await; // playerJoined B
    recv_game(&mut a).await; // playerJoined C
    recv_game(&mut b).await; // playerJoined C

    send_game(
        &mut a,
        json!({ "type": "moveCube", "x": 1, "y": 0.5, "z": 2, "rx": 0, "ry": 30, "rz": 0 }),
    )
    .await;

    let expected = json!({
        "type": "moveCube", "sid": sid_a,
        "x": 1.0, "y": 0.5, "z": 2.0, "rx": 0.0, "ry": 30.0, "rz": 0.0
    });
    assert_eq!(recv_game(&mut b).await, expected);
    assert_eq!(recv_game(&mut c).await, expected);
    expect_silence(&mut a).await;
}

#[tokio::test]
async fn test_unknown_game_message_rejected() {
    let addr = start_server().await;
    let (mut a, _, _) = join(&addr, json!({})).await;

    send_game(&mut a, json!({ "type": "teleport" })).await;

    match recv(&mut a).await {
        Payload::System(SystemMessage::Error { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected Error 400, got {other:?}"),
    }
}

// =========================================================================
// Leave
// =========================================================================

#[tokio::test]
async fn test_leave_notifies_remaining_and_drops_record() {
    let addr = start_server().await;
    let (mut a, _, _) = join(&addr, json!({})).await;
    let (b, sid_b, _) = join(&addr, json!({})).await;
    recv_game(&mut a).await; // playerJoined B

    drop(b);

    assert_eq!(
        recv_game(&mut a).await,
        json!({ "type": "playerLeft", "sid": sid_b })
    );

    let (_c, _, snapshot) = join(&addr, json!({})).await;
    let players = snapshot["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert!(players.iter().all(|p| p["sessionId"] != sid_b.as_str()));
}

#[tokio::test]
async fn test_move_after_leave_room_is_silent() {
    let addr = start_server().await;
    let (mut a, _, _) = join(&addr, json!({})).await;
    let (mut b, sid_b, _) = join(&addr, json!({})).await;
    recv_game(&mut a).await; // playerJoined B

    send(&mut b, Payload::System(SystemMessage::LeaveRoom)).await;
    send_game(&mut b, json!({ "type": "playerMove", "x": 4 })).await;

    assert_eq!(
        recv_game(&mut a).await,
        json!({ "type": "playerLeft", "sid": sid_b })
    );
    expect_silence(&mut a).await;
    expect_silence(&mut b).await;
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_room_listed_under_chosen_name() {
    let addr = start_server().await;
    let (_a, _, _) = join(&addr, json!({ "roomName": "Cube Lab" })).await;
    let (mut b, _, _) = join(&addr, json!({})).await;

    send(&mut b, Payload::System(SystemMessage::ListRooms)).await;

    match recv(&mut b).await {
        Payload::System(SystemMessage::RoomList { rooms }) => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].name, "Cube Lab");
            assert_eq!(rooms[0].client_count, 2);
            assert_eq!(rooms[0].max_clients, 10);
        }
        other => panic!("expected RoomList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_room_name_listed_as_game_room() {
    let addr = start_server().await;
    let (mut a, _, _) = join(&addr, json!({ "roomName": "" })).await;

    send(&mut a, Payload::System(SystemMessage::ListRooms)).await;

    match recv(&mut a).await {
        Payload::System(SystemMessage::RoomList { rooms }) => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].name, "Game Room");
        }
        other => panic!("expected RoomList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_eleventh_player_gets_new_room() {
    let addr = start_server().await;
    let mut clients = Vec::new();
    for _ in 0..10 {
        clients.push(join(&addr, json!({})).await);
    }

    let (_late, _, snapshot) = join(&addr, json!({})).await;
    assert_eq!(snapshot["players"], json!([]));
}

// =========================================================================
// Health
// =========================================================================

async fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes())
        .await
        .expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    response
}

#[tokio::test]
async fn test_health_endpoint() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(health::serve(listener));

    let ok = http_get(addr, "/health").await;
    assert!(ok.starts_with("HTTP/1.1 200 OK"));
    assert!(ok.ends_with(r#"{"status":"ok"}"#));

    let missing = http_get(addr, "/nope").await;
    assert!(missing.starts_with("HTTP/1.1 404"));
}
