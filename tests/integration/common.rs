//! Shared test scaffolding: an in-memory duplex transport standing in for a real
//! WebSocket, plus a one-line `Hub` builder wired the same way `roomcore::build`
//! wires production (in-process bus, in-memory store, mock AI provider).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use roomcore::ai::Manager as AiManager;
use roomcore::ai::provider::MockProvider;
use roomcore::bus::EventBus;
use roomcore::bus::local::LocalBus;
use roomcore::config::Config;
use roomcore::error::SessionError;
use roomcore::hub::Hub;
use roomcore::models::OutboundFrame;
use roomcore::session::{FrameReader, FrameWriter, RawFrame, SessionHandle, spawn_session};
use roomcore::store::{SqliteStore, Store};
use roomcore::topics::TopicFormatter;

pub struct ChannelReader {
    pub rx: mpsc::Receiver<RawFrame>,
}

#[async_trait]
impl FrameReader for ChannelReader {
    async fn read(&mut self) -> Result<RawFrame, SessionError> {
        self.rx.recv().await.ok_or(SessionError::Closed)
    }
}

pub struct ChannelWriter {
    pub tx: mpsc::Sender<RawFrame>,
}

#[async_trait]
impl FrameWriter for ChannelWriter {
    async fn write(&mut self, frame: RawFrame) -> Result<(), SessionError> {
        self.tx.send(frame).await.map_err(|_| SessionError::Closed)
    }
}

/// A fake wire, as far as the session layer can tell: one channel feeding the
/// read loop, one channel the write loop appends to.
pub struct FakeConnection {
    pub inbound: mpsc::Sender<RawFrame>,
    pub outbound: mpsc::Receiver<RawFrame>,
}

impl FakeConnection {
    pub fn pair() -> (Self, ChannelReader, ChannelWriter) {
        let (in_tx, in_rx) = mpsc::channel(64);
        let (out_tx, out_rx) = mpsc::channel(64);
        (FakeConnection { inbound: in_tx, outbound: out_rx }, ChannelReader { rx: in_rx }, ChannelWriter { tx: out_tx })
    }

    pub async fn send_text(&self, content: &str) {
        self.inbound.send(RawFrame::Text(content.to_string())).await.unwrap();
    }

    /// Waits for the next non-ping/pong frame and decodes it as an `OutboundFrame`.
    pub async fn recv_message(&mut self) -> OutboundFrame {
        loop {
            match self.outbound.recv().await.expect("connection closed before a message arrived") {
                RawFrame::Text(body) => return serde_json::from_str(&body).unwrap(),
                RawFrame::Ping | RawFrame::Pong => continue,
                RawFrame::Close => panic!("connection closed before a message arrived"),
            }
        }
    }

    pub async fn recv_message_within(&mut self, timeout: Duration) -> Option<OutboundFrame> {
        tokio::time::timeout(timeout, self.recv_message()).await.ok()
    }
}

/// Everything a transport adapter (in production, the WebSocket route) is
/// handed via Rocket's managed state: the hub plus the bus/topics/config it was
/// built from, so a new session can be wired onto the very same bus the hub's
/// handlers are listening on.
pub struct TestServer {
    pub hub: Arc<Hub>,
    pub bus: Arc<dyn EventBus>,
    pub topics: TopicFormatter,
    pub config: Config,
}

/// Wires a hub exactly like production's `roomcore::build`, minus the HTTP/WS
/// mount: in-process bus, `:memory:` store, mock AI provider with no artificial
/// delay.
pub fn test_server() -> TestServer {
    test_server_with_config(Config::default())
}

pub fn test_server_with_config(config: Config) -> TestServer {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let bus: Arc<dyn EventBus> = Arc::new(LocalBus::new());
    let topics = TopicFormatter::new(config.topic_prefix.clone());
    let provider = Arc::new(MockProvider::default().with_response_delay(Duration::from_millis(0)));
    let ai = Arc::new(AiManager::new(store.clone(), bus.clone(), topics.clone(), config.clone(), provider));
    let hub = Arc::new(Hub::new(store, bus.clone(), topics.clone(), config.clone(), ai));
    TestServer { hub, bus, topics, config }
}

/// Connects a new session to `room_id` under the server and returns the fake
/// connection driving it plus the handle the room now holds. Mirrors what
/// `ws::connect` does on a real upgrade: create-or-find the room, spawn the
/// session, register the handle.
pub async fn connect(server: &TestServer, room_id: &str, user_id: &str, username: &str) -> (FakeConnection, SessionHandle) {
    connect_with_config(server, room_id, user_id, username, &server.config).await
}

/// Same as [`connect`], but with an explicit `Config` for this one session —
/// the seam the backpressure test uses to give a single client a tiny outbound
/// queue without shrinking it for every other session on the server.
pub async fn connect_with_config(
    server: &TestServer,
    room_id: &str,
    user_id: &str,
    username: &str,
    config: &Config,
) -> (FakeConnection, SessionHandle) {
    let (conn, reader, writer) = FakeConnection::pair();
    let room = server.hub.get_or_create_room(room_id).await;

    let terminate_hub = server.hub.clone();
    let (handle, _read_task, _write_task) = spawn_session(
        reader,
        writer,
        room_id.to_string(),
        user_id.to_string(),
        username.to_string(),
        server.bus.clone(),
        server.topics.clone(),
        config.clone(),
        move |handle| {
            let hub = terminate_hub.clone();
            tokio::spawn(async move {
                if let Some(room) = hub.find_room(&handle.room_id).await {
                    room.remove_client(&handle.user_id).await;
                }
            });
        },
    );
    room.add_client(handle.clone()).await;
    (conn, handle)
}

/// Asserts a frame is a rewrapped system announcement (join/leave), without
/// pinning down its exact wording.
pub fn assert_system(frame: &OutboundFrame) {
    assert_eq!(frame.sender_id, "system");
}
