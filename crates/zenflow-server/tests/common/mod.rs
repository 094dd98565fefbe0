//! Shared harness for the server integration tests.
//!
//! Starts a real [`Server`] on an ephemeral loopback port with a recording
//! injector and a recording presence advertiser, and connects real
//! WebSocket clients to it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use zenflow_server::domain::ServerConfig;
use zenflow_server::infrastructure::input_injection::RecordingInjector;
use zenflow_server::infrastructure::presence::{PresenceService, RecordingAdvertiser};
use zenflow_server::infrastructure::{Server, ServerError};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct Harness {
    pub server: Arc<Server>,
    pub addr: SocketAddr,
    pub injector: Arc<RecordingInjector>,
    pub advertiser: RecordingAdvertiser,
    pub task: JoinHandle<Result<(), ServerError>>,
}

/// Config with short timeouts so shutdown tests finish quickly.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        close_timeout: Duration::from_secs(2),
        ..ServerConfig::default()
    }
}

pub async fn start(config: ServerConfig, injector: RecordingInjector) -> Harness {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let injector = Arc::new(injector);
    let advertiser = RecordingAdvertiser::new();
    let presence = PresenceService::new(Box::new(advertiser.clone()), config.presence.clone());
    let server = Arc::new(Server::new(config, injector.clone(), presence));

    let task = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve(listener).await })
    };

    Harness {
        server,
        addr,
        injector,
        advertiser,
        task,
    }
}

impl Harness {
    pub async fn connect(&self) -> Client {
        let (ws, _) = connect_async(format!("ws://{}", self.addr))
            .await
            .expect("client must connect");
        ws
    }

    /// Polls until the server reports `expected` live sessions.
    pub async fn wait_for_sessions(&self, expected: usize) -> bool {
        for _ in 0..150 {
            if self.server.active_sessions().await == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Sends one text frame.
pub async fn send(ws: &mut Client, frame: &str) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Reads the next text frame as JSON, skipping control frames.
pub async fn recv(ws: &mut Client) -> Value {
    let read = async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("response must arrive within 5s")
}

/// Sends one frame and returns the response.
pub async fn request(ws: &mut Client, frame: &str) -> Value {
    send(ws, frame).await;
    recv(ws).await
}
