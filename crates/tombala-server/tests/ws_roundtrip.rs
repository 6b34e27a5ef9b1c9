// End-to-end tests over a real socket: bind on an ephemeral port, connect
// WebSocket clients and exchange JSON events with the engine.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use tombala_core::{Engine, GameConfig};
use tombala_server::ws_server;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (String, Engine) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let engine = Engine::new(&GameConfig::default());
    tokio::spawn(ws_server::run(listener, engine.clone()));
    (format!("ws://{addr}"), engine)
}

async fn connect(url: &str) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    client
}

/// Read frames until one carries `event`, returning its `data`.
async fn expect_event(client: &mut Client, event: &str) -> Value {
    let wait = async {
        loop {
            let frame = client.next().await.unwrap().unwrap();
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).unwrap();
                if value["event"] == event {
                    return value["data"].clone();
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("no {event} event within 5s"))
}

async fn send(client: &mut Client, json: &str) {
    client.send(Message::Text(json.into())).await.unwrap();
}

#[tokio::test]
async fn connect_receives_initial_game_state() {
    let (url, _engine) = spawn_server().await;
    let mut client = connect(&url).await;

    let state = expect_event(&mut client, "gameState").await;
    assert_eq!(state["active"], false);
    assert_eq!(state["message"], "Waiting for players...");
}

#[tokio::test]
async fn join_returns_board_and_roster_reaches_everyone() {
    let (url, _engine) = spawn_server().await;
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    expect_event(&mut alice, "gameState").await;
    expect_event(&mut bob, "gameState").await;

    send(&mut alice, r#"{"event":"join"}"#).await;

    let board = expect_event(&mut alice, "board").await;
    let rows = board["board"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.as_array().unwrap().len() == 5));

    let update = expect_event(&mut bob, "playerUpdate").await;
    assert_eq!(update["players"][0]["name"], "Player 1");
}

#[tokio::test]
async fn closing_the_socket_removes_the_player() {
    let (url, engine) = spawn_server().await;
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    send(&mut alice, r#"{"event":"join"}"#).await;
    send(&mut bob, r#"{"event":"join"}"#).await;
    expect_event(&mut alice, "board").await;
    expect_event(&mut bob, "board").await;
    assert_eq!(engine.players().await.len(), 2);

    bob.close(None).await.unwrap();

    let removed = async {
        while engine.players().await.len() != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), removed)
        .await
        .unwrap();
    assert_eq!(engine.players().await.len(), 1);
}
