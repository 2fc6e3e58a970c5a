//! End-to-end protocol tests against a real listener, using
//! `tokio-tungstenite` as the peer.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::Frame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::{CloseCode, Data, OpCode};

use subscription_gateway::app_state::AppState;
use subscription_gateway::client::{ClientError, ClientEvent, SubscriberClient};
use subscription_gateway::config::ServerConfig;
use subscription_gateway::router::{WS_PATH, build_app, build_state};

const TIMEOUT: Duration = Duration::from_secs(5);

const SCENARIO_A: &str =
    r#"{"MessageType":0,"SubscriberId":100,"Name":"John Doe","Topic":"Weather reports"}"#;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Boot a server on an ephemeral port; returns the host:port and its state.
async fn boot_server() -> (String, AppState) {
    boot_server_with(ServerConfig {
        keepalive: None,
        ..ServerConfig::default()
    })
    .await
}

async fn boot_server_with(config: ServerConfig) -> (String, AppState) {
    let state = build_state(&config);
    let app = build_app(state.clone());

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr.to_string(), state)
}

async fn connect(addr: &str) -> WsStream {
    let Ok((ws, _)) = connect_async(format!("ws://{addr}{WS_PATH}")).await else {
        panic!("ws connect failed");
    };
    ws
}

/// Next text message as JSON, skipping control frames.
async fn recv_json(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let Ok(Some(Ok(msg))) = timeout(TIMEOUT, ws.next()).await else {
            panic!("no message from server");
        };
        match msg {
            Message::Text(text) => {
                let Ok(value) = serde_json::from_str(text.as_str()) else {
                    panic!("server sent invalid json: {text}");
                };
                return value;
            }
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

async fn send_text(ws: &mut WsStream, text: &str) {
    if ws.send(Message::text(text.to_owned())).await.is_err() {
        panic!("send failed");
    }
}

fn remove_request(subscription_id: &str) -> String {
    format!(r#"{{"MessageType":2,"SubscriberId":100,"SubscriptionId":"{subscription_id}"}}"#)
}

fn subscription_id_of(response: &serde_json::Value) -> String {
    let Some(id) = response["SubscriptionId"].as_str() else {
        panic!("response has no SubscriptionId: {response}");
    };
    if uuid::Uuid::parse_str(id).is_err() {
        panic!("SubscriptionId is not a uuid: {id}");
    }
    id.to_owned()
}

#[tokio::test]
async fn scenario_a_add_subscriber() {
    let (addr, state) = boot_server().await;
    let mut ws = connect(&addr).await;

    send_text(&mut ws, SCENARIO_A).await;
    let resp = recv_json(&mut ws).await;

    assert_eq!(resp["MessageType"], 1);
    assert_eq!(resp["SubscriberId"], 100);
    assert_eq!(resp["Success"], true);
    let id = subscription_id_of(&resp);

    let records = state.dispatcher.registry().list(None).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records.first().map(|r| r.subscription_id.to_string()), Some(id));
}

#[tokio::test]
async fn scenario_b_remove_once_then_miss() {
    let (addr, state) = boot_server().await;
    let mut ws = connect(&addr).await;

    send_text(&mut ws, SCENARIO_A).await;
    let id = subscription_id_of(&recv_json(&mut ws).await);

    send_text(&mut ws, &remove_request(&id)).await;
    let first = recv_json(&mut ws).await;
    assert_eq!(first["MessageType"], 3);
    assert_eq!(first["SubscriberId"], 100);
    assert_eq!(first["SubscriptionId"], id.as_str());
    assert_eq!(first["Success"], true);

    send_text(&mut ws, &remove_request(&id)).await;
    let second = recv_json(&mut ws).await;
    assert_eq!(second["Success"], false);

    assert!(state.dispatcher.registry().is_empty().await);
}

#[tokio::test]
async fn remove_never_issued_id_echoes_subscriber() {
    let (addr, _) = boot_server().await;
    let mut ws = connect(&addr).await;

    let bogus = uuid::Uuid::new_v4().to_string();
    send_text(
        &mut ws,
        &format!(r#"{{"MessageType":"RemoveSubscriberRequest","SubscriberId":7,"SubscriptionId":"{bogus}"}}"#),
    )
    .await;
    let resp = recv_json(&mut ws).await;
    assert_eq!(resp["SubscriberId"], 7);
    assert_eq!(resp["SubscriptionId"], bogus.as_str());
    assert_eq!(resp["Success"], false);
}

#[tokio::test]
async fn scenario_c_fragmented_request_is_reassembled() {
    let (addr, _) = boot_server().await;
    let mut ws = connect(&addr).await;

    let bytes = SCENARIO_A.as_bytes();
    let (head, rest) = bytes.split_at(20);
    let (middle, tail) = rest.split_at(30);
    let frames = [
        Frame::message(head.to_vec(), OpCode::Data(Data::Text), false),
        Frame::message(middle.to_vec(), OpCode::Data(Data::Continue), false),
        Frame::message(tail.to_vec(), OpCode::Data(Data::Continue), true),
    ];
    for frame in frames {
        if ws.send(Message::Frame(frame)).await.is_err() {
            panic!("frame send failed");
        }
    }
    let fragmented = recv_json(&mut ws).await;

    send_text(&mut ws, SCENARIO_A).await;
    let whole = recv_json(&mut ws).await;

    for key in ["MessageType", "SubscriberId", "Success"] {
        assert_eq!(fragmented[key], whole[key], "field {key} differs");
    }
    assert_ne!(subscription_id_of(&fragmented), subscription_id_of(&whole));
}

#[tokio::test]
async fn unknown_and_malformed_messages_keep_session_open() {
    let (addr, _) = boot_server().await;
    let mut ws = connect(&addr).await;

    send_text(&mut ws, r#"{"MessageType":42,"Foo":"bar"}"#).await;
    send_text(&mut ws, "definitely not json").await;
    send_text(&mut ws, r#"{"SubscriberId":100}"#).await;
    send_text(&mut ws, SCENARIO_A).await;

    // The first reply must be for the add; nothing was sent for the others.
    let resp = recv_json(&mut ws).await;
    assert_eq!(resp["MessageType"], 1);
    assert_eq!(resp["Success"], true);
}

#[tokio::test]
async fn binary_frame_closes_session() {
    let (addr, _) = boot_server().await;
    let mut ws = connect(&addr).await;

    if ws.send(Message::binary(vec![0u8, 1, 2])).await.is_err() {
        panic!("send failed");
    }

    loop {
        match timeout(TIMEOUT, ws.next()).await {
            Ok(Some(Ok(Message::Close(frame)))) => {
                if let Some(frame) = frame {
                    assert_eq!(frame.code, CloseCode::Unsupported);
                }
                break;
            }
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
            Ok(None | Some(Err(_))) => break,
            Ok(Some(Ok(other))) => panic!("unexpected message after binary frame: {other:?}"),
            Err(_) => panic!("server did not end the session"),
        }
    }
}

#[tokio::test]
async fn oversized_message_ends_session_unprocessed() {
    let (addr, state) = boot_server_with(ServerConfig {
        keepalive: None,
        max_message_size: 1024,
        ..ServerConfig::default()
    })
    .await;
    let mut ws = connect(&addr).await;

    let big = format!(
        r#"{{"MessageType":0,"SubscriberId":1,"Name":"{}","Topic":"t"}}"#,
        "x".repeat(4096)
    );
    // The server may drop the socket before the write finishes.
    let _ = ws.send(Message::text(big)).await;

    loop {
        match timeout(TIMEOUT, ws.next()).await {
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
            Ok(Some(Ok(Message::Close(_))) | None | Some(Err(_))) => break,
            Ok(Some(Ok(other))) => panic!("oversized message was answered: {other:?}"),
            Err(_) => panic!("server did not end the session"),
        }
    }
    assert!(state.dispatcher.registry().is_empty().await);
}

#[tokio::test]
async fn idle_connection_receives_keepalive_pings() {
    let (addr, _) = boot_server_with(ServerConfig {
        keepalive: Some(Duration::from_millis(50)),
        ..ServerConfig::default()
    })
    .await;
    let mut ws = connect(&addr).await;

    let Ok(Some(Ok(first))) = timeout(TIMEOUT, ws.next()).await else {
        panic!("no frame from idle server");
    };
    assert!(matches!(first, Message::Ping(_)), "expected ping, got {first:?}");

    // Pings do not disturb the request loop.
    send_text(&mut ws, SCENARIO_A).await;
    let resp = recv_json(&mut ws).await;
    assert_eq!(resp["MessageType"], 1);
}

#[tokio::test]
async fn subscriptions_are_shared_across_connections_and_outlive_them() {
    let (addr, state) = boot_server().await;

    let mut first = connect(&addr).await;
    send_text(&mut first, SCENARIO_A).await;
    let id = subscription_id_of(&recv_json(&mut first).await);
    if first.close(None).await.is_err() {
        panic!("close failed");
    }
    drop(first);

    // Closing the owning connection does not drop the subscription.
    let registry = state.dispatcher.registry();
    assert_eq!(registry.len().await, 1);

    let mut second = connect(&addr).await;
    send_text(&mut second, &remove_request(&id)).await;
    let resp = recv_json(&mut second).await;
    assert_eq!(resp["Success"], true);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn concurrent_connections_get_unique_ids() {
    let (addr, state) = boot_server().await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let addr = addr.clone();
        tasks.push(tokio::spawn(async move {
            let mut ws = connect(&addr).await;
            send_text(&mut ws, SCENARIO_A).await;
            subscription_id_of(&recv_json(&mut ws).await)
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for task in tasks {
        let Ok(id) = task.await else {
            panic!("client task failed");
        };
        ids.insert(id);
    }
    assert_eq!(ids.len(), 8);
    assert_eq!(state.dispatcher.registry().len().await, 8);
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> ClientEvent {
    let Ok(Some(event)) = timeout(TIMEOUT, rx.recv()).await else {
        panic!("no client event");
    };
    event
}

async fn next_response(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> serde_json::Value {
    let ClientEvent::MessageReceived(text) = next_event(rx).await else {
        panic!("expected a message event");
    };
    let Ok(value) = serde_json::from_str(&text) else {
        panic!("invalid json: {text}");
    };
    value
}

#[tokio::test]
async fn client_caches_last_subscription_for_remove() {
    let (addr, state) = boot_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let Ok(client) = SubscriberClient::connect(&format!("ws://{addr}{WS_PATH}"), Arc::new(tx)).await
    else {
        panic!("client connect failed");
    };
    assert!(client.is_open());
    assert_eq!(client.last_subscription_id(), None);

    // Nothing cached yet: the nil id is sent and misses.
    assert!(client.remove_subscriber(100).await.is_ok());
    let miss = next_response(&mut rx).await;
    assert_eq!(miss["Success"], false);
    assert_eq!(miss["SubscriptionId"], uuid::Uuid::nil().to_string());

    assert!(client.add_subscriber(100, "John Doe", "Weather reports").await.is_ok());
    let added = next_response(&mut rx).await;
    let id = subscription_id_of(&added);
    assert_eq!(client.last_subscription_id().map(|s| s.to_string()), Some(id.clone()));

    assert!(client.remove_subscriber(100).await.is_ok());
    let removed = next_response(&mut rx).await;
    assert_eq!(removed["SubscriptionId"], id.as_str());
    assert_eq!(removed["Success"], true);

    // The slot is not cleared by a remove; a repeat misses.
    assert!(client.remove_subscriber(100).await.is_ok());
    assert_eq!(next_response(&mut rx).await["Success"], false);
    assert!(state.dispatcher.registry().is_empty().await);

    assert!(client.close().await.is_ok());
    // A locally started close reports nothing.
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.ok().flatten().is_none());
}

#[tokio::test]
async fn client_send_frame_passes_raw_text() {
    let (addr, _) = boot_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let Ok(client) = SubscriberClient::connect(&format!("ws://{addr}{WS_PATH}"), Arc::new(tx)).await
    else {
        panic!("client connect failed");
    };

    assert!(client.send_frame(SCENARIO_A).await.is_ok());
    let resp = next_response(&mut rx).await;
    assert_eq!(resp["MessageType"], 1);
    assert!(client.last_subscription_id().is_some());

    assert!(client.close().await.is_ok());
}

/// Accepts one WebSocket connection and hands it to `peer`.
async fn spawn_peer<F, Fut>(peer: F) -> String
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        peer(ws).await;
    });
    format!("ws://{addr}{WS_PATH}")
}

#[tokio::test]
async fn client_reports_server_close() {
    let url = spawn_peer(|mut ws| async move {
        let _ = ws.close(None).await;
        // Drain until the client's close reply arrives.
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let Ok(client) = SubscriberClient::connect(&url, Arc::new(tx)).await else {
        panic!("client connect failed");
    };

    assert_eq!(next_event(&mut rx).await, ClientEvent::Closed);
    assert!(!client.is_open());
    assert!(matches!(
        client.send_frame(SCENARIO_A).await,
        Err(ClientError::Closed)
    ));
}

#[tokio::test]
async fn client_reports_abrupt_disconnect() {
    let url = spawn_peer(|ws| async move {
        // Drop the socket without a close frame.
        drop(ws);
    })
    .await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let Ok(_client) = SubscriberClient::connect(&url, Arc::new(tx)).await else {
        panic!("client connect failed");
    };

    let ClientEvent::Error(reason) = next_event(&mut rx).await else {
        panic!("expected an error event");
    };
    assert!(!reason.is_empty());
}

#[tokio::test]
async fn restapi_answers_hello_over_http() {
    let (addr, _) = boot_server().await;
    let Ok(resp) = reqwest::get(format!("http://{addr}/restapi/status")).await else {
        panic!("http request failed");
    };
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let Ok(body) = resp.text().await else {
        panic!("body read failed");
    };
    assert_eq!(body, "Hello world!");
}
