//! Drives a real `GachaClient` against a small in-process gacha server
//! over WebSocket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gachalink::prelude::*;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const FRAME: Duration = Duration::from_millis(16);

/// Serves one client: answers user info and single pulls, deducting the
/// cost from a starting balance.
async fn serve_one(listener: TcpListener, mut currency: u32) {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut ws = tokio_tungstenite::accept_async(stream)
        .await
        .expect("server handshake");

    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let request: Value = serde_json::from_str(text.as_str()).expect("client sends JSON");
        let reply = match request["type"].as_str() {
            Some("get_user_info") => json!({
                "type": "user_info",
                "data": json!({ "username": "e2e", "currency": currency, "pityCount": 0 }).to_string(),
            }),
            Some("single_pull") => {
                currency -= 160;
                json!({
                    "type": "gacha_result",
                    "data": json!({
                        "characters": [{ "id": 9, "name": "Raiden", "rarity": 5, "imageUrl": "", "rate": 0.6 }],
                        "isNew": [true],
                        "timestamp": 1,
                    }).to_string(),
                })
            }
            Some("ping") => json!({ "type": "pong" }),
            _ => json!({ "type": "error", "error": "unsupported" }),
        };
        if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
            break;
        }
    }
}

#[derive(Default)]
struct Log {
    states: Vec<ConnectionState>,
    steps: Vec<(usize, String)>,
    balances: Vec<u32>,
    completed: usize,
}

impl ClientObserver for Log {
    fn on_connection_changed(&mut self, state: ConnectionState) {
        self.states.push(state);
    }
    fn on_user_info(&mut self, info: &UserInfo) {
        self.balances.push(info.currency);
    }
    fn on_playback_step(&mut self, index: usize, character: &Character) {
        self.steps.push((index, character.name.clone()));
    }
    fn on_playback_complete(&mut self) {
        self.completed += 1;
    }
}

/// Ticks the client at frame rate until `done` holds.
async fn tick_until<C: gachalink::Connector>(
    client: &mut GachaClient<Log, C>,
    what: &str,
    done: impl Fn(&GachaClient<Log, C>) -> bool,
) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !done(client) {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(FRAME).await;
        client.tick(FRAME);
    }
}

#[tokio::test]
async fn test_single_pull_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    let server = tokio::spawn(serve_one(listener, 500));

    let config = ClientConfig::with_url(url).reveal(RevealConfig::instant());
    let mut client = GachaClient::builder()
        .config(config)
        .observer(Log::default())
        .build();

    client.connect();
    tick_until(&mut client, "initial balance", |c| c.user_info().is_some()).await;
    assert_eq!(client.user_info().map(|u| u.currency), Some(500));

    client.request_pull(PullKind::Single).expect("pull admitted");
    tick_until(&mut client, "reveal", |c| c.observer().completed == 1).await;
    tick_until(&mut client, "refreshed balance", |c| {
        c.user_info().map(|u| u.currency) == Some(340)
    })
    .await;

    let log = client.observer();
    assert_eq!(log.steps, vec![(0, "Raiden".to_owned())]);
    assert_eq!(log.balances, vec![500, 340]);
    assert!(!client.is_pull_in_flight());

    client.disconnect();
    tick_until(&mut client, "close", |c| c.state() == ConnectionState::Disconnected).await;
    assert_eq!(
        client.observer().states,
        vec![
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Disconnected,
        ]
    );

    server.await.expect("server task");
}

#[tokio::test]
async fn test_unreachable_server_ends_disconnected() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let mut client = GachaClient::builder()
        .url(url)
        .observer(Log::default())
        .build();
    client.connect();
    tick_until(&mut client, "failure", |c| c.state() == ConnectionState::Disconnected).await;

    assert_eq!(
        client.observer().states,
        vec![ConnectionState::Connecting, ConnectionState::Disconnected]
    );
    assert!(client.request_pull(PullKind::Single).is_err());
}
