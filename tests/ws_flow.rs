use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use canvaswars_rs::{app, config::ServerConfig, AppState};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(AppState::new(&ServerConfig::default()), "public");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn emit(ws: &mut Client, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::Text(frame)).await.unwrap();
}

/// Read frames until one with the given event name arrives
async fn expect(ws: &mut Client, event: &str) -> Value {
    let wait = async {
        while let Some(frame) = ws.next().await {
            if let Message::Text(text) = frame.unwrap() {
                let value: Value = serde_json::from_str(&text).unwrap();
                if value["event"] == event {
                    return value["data"].clone();
                }
            }
        }
        panic!("Connection closed while waiting for {}", event);
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {}", event))
}

#[tokio::test]
async fn test_host_round_paint_and_erase() {
    let addr = start_server().await;
    let mut host = connect(addr).await;

    emit(
        &mut host,
        "createSession",
        json!({ "pin": "42", "gridSize": 10, "cooldownSec": 2 }),
    )
    .await;
    emit(
        &mut host,
        "join",
        json!({ "pin": "42", "name": "Hana", "team": "A", "isHost": true, "clientId": "host-1" }),
    )
    .await;

    expect(&mut host, "hostGranted").await;
    let snapshot = expect(&mut host, "snapshot").await;
    assert_eq!(snapshot["meta"]["gridSize"], 10);
    assert_eq!(snapshot["meta"]["cooldownSec"], 2);
    assert_eq!(snapshot["meta"]["status"], "lobby");
    assert_eq!(snapshot["players"]["host-1"]["isHost"], true);

    emit(&mut host, "start", json!({ "pin": "42", "roundMin": 0 })).await;
    let meta = expect(&mut host, "meta").await;
    assert_eq!(meta["status"], "running");
    assert_eq!(meta["endsAt"], Value::Null);
    assert!(meta["startedAt"].is_i64());

    for (x, y) in [(3, 3), (2, 2), (4, 4)] {
        emit(
            &mut host,
            "placePixel",
            json!({ "pin": "42", "x": x, "y": y, "color": "#ff0000", "team": "A" }),
        )
        .await;
        let pixel = expect(&mut host, "pixel").await;
        assert_eq!(pixel["key"], format!("{}_{}", x, y));
        assert_eq!(pixel["cell"]["color"], "#ff0000");
        assert_eq!(pixel["cell"]["team"], "A");
    }

    // out of bounds is silently dropped; the next event is the erase
    emit(
        &mut host,
        "placePixel",
        json!({ "pin": "42", "x": 10, "y": 0, "color": "#ff0000", "team": "A" }),
    )
    .await;
    emit(&mut host, "eraseArea", json!({ "pin": "42", "cx": 3, "cy": 3, "size": 3 })).await;

    let erase = expect(&mut host, "erase").await;
    let mut keys: Vec<String> = erase["keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap().to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["2_2", "3_3", "4_4"]);

    emit(&mut host, "stop", json!({ "pin": "42" })).await;
    let meta = expect(&mut host, "meta").await;
    assert_eq!(meta["status"], "ended");
    assert!(meta["endsAt"].is_i64());
}

#[tokio::test]
async fn test_second_host_claim_denied() {
    let addr = start_server().await;
    let mut host = connect(addr).await;
    let mut rival = connect(addr).await;

    emit(
        &mut host,
        "join",
        json!({ "pin": "42", "name": "Hana", "team": "A", "isHost": true, "clientId": "h" }),
    )
    .await;
    expect(&mut host, "hostGranted").await;

    emit(
        &mut rival,
        "join",
        json!({ "pin": 42, "name": "Rico", "team": "B", "isHost": true, "clientId": "r" }),
    )
    .await;
    let reason = expect(&mut rival, "hostDenied").await;
    assert!(reason.is_string());

    let players = expect(&mut rival, "players").await;
    assert_eq!(players["h"]["isHost"], true);
    assert_eq!(players["r"]["isHost"], false);

    emit(&mut rival, "resetGrid", json!({ "pin": "42" })).await;
    expect(&mut rival, "hostRequired").await;
}

#[tokio::test]
async fn test_placement_before_start_is_dropped() {
    let addr = start_server().await;
    let mut host = connect(addr).await;

    emit(
        &mut host,
        "join",
        json!({ "pin": "9", "name": "Hana", "team": "A", "isHost": true, "clientId": "h" }),
    )
    .await;
    expect(&mut host, "snapshot").await;

    emit(
        &mut host,
        "placePixel",
        json!({ "pin": "9", "x": 1, "y": 1, "color": "#ff0000", "team": "A" }),
    )
    .await;
    emit(&mut host, "resetGrid", json!({ "pin": "9" })).await;

    // the grid reset is the first thing to come back: no pixel was painted
    let next = async {
        loop {
            match host.next().await {
                Some(Ok(Message::Text(text))) => {
                    let value: Value = serde_json::from_str(&text).unwrap();
                    if value["event"] != "players" {
                        return value;
                    }
                }
                Some(_) => {}
                None => panic!("Connection closed"),
            }
        }
    };
    let value = tokio::time::timeout(Duration::from_secs(5), next).await.unwrap();
    assert_eq!(value["event"], "gridReset");
}
