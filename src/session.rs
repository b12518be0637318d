//! Transport session (C1). Two independent tasks per connection — read and write —
//! sharing only the outbound queue. Written against a small duplex-frame
//! abstraction so production can drive it with a real WebSocket upgrade and tests
//! can drive it with an in-memory channel pair.
//!
//! Constants below match the source system's client exactly: `write_wait=10s`,
//! `pong_wait=120s`, `ping_period=108s` (90% of pong_wait), `max_message_size=1024`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::bus::EventBus;
use crate::config::Config;
use crate::error::SessionError;
use crate::events::ChatEvent;
use crate::models::{ChatMessage, OutboundFrame, is_heartbeat_content};
use crate::topics::TopicFormatter;

/// One logical frame off (or onto) the wire. `Text` carries a JSON body; the rest
/// are protocol-level control frames.
#[derive(Debug, Clone)]
pub enum RawFrame {
    Text(String),
    Ping,
    Pong,
    Close,
}

#[async_trait]
pub trait FrameReader: Send {
    /// Returns `Err` on any terminal condition: closed socket, protocol error, EOF.
    async fn read(&mut self) -> Result<RawFrame, SessionError>;
}

#[async_trait]
pub trait FrameWriter: Send {
    async fn write(&mut self, frame: RawFrame) -> Result<(), SessionError>;
}

/// What the room/hub hold for each connected client: just enough to enqueue
/// outbound traffic and identify the session. Cloning is cheap; the underlying
/// `mpsc::Sender` is reference-counted.
#[derive(Clone)]
pub struct SessionHandle {
    pub user_id: String,
    pub username: String,
    pub room_id: String,
    pub(crate) outbound: mpsc::Sender<OutboundFrame>,
}

impl SessionHandle {
    #[cfg(test)]
    pub fn for_test(user_id: &str, room_id: &str, capacity: usize) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                user_id: user_id.to_string(),
                username: user_id.to_string(),
                room_id: room_id.to_string(),
                outbound: tx,
            },
            rx,
        )
    }

    /// Non-blocking enqueue. Per the backpressure contract, a full queue means the
    /// caller (room fan-out) must drop this session rather than wait.
    pub fn try_send(&self, frame: OutboundFrame) -> Result<(), ()> {
        self.outbound.try_send(frame).map_err(|_| ())
    }
}

/// Spawns the read and write tasks for one newly-accepted connection and returns
/// the handle a `Room` should register, plus both tasks' join handles so a
/// transport adapter that owns the connection's lifetime (e.g. a WebSocket
/// upgrade handler) can await session teardown before releasing the socket.
/// `on_terminate` is invoked (possibly twice, harmlessly — unregistration is
/// idempotent) once either task observes the connection is finished.
pub fn spawn_session<R, W, F>(
    reader: R,
    writer: W,
    room_id: String,
    user_id: String,
    username: String,
    bus: Arc<dyn EventBus>,
    topics: TopicFormatter,
    config: Config,
    on_terminate: F,
) -> (SessionHandle, tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>)
where
    R: FrameReader + 'static,
    W: FrameWriter + 'static,
    F: Fn(SessionHandle) + Send + Sync + Clone + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::channel(config.session_queue_depth);
    let handle = SessionHandle {
        user_id: user_id.clone(),
        username: username.clone(),
        room_id: room_id.clone(),
        outbound: outbound_tx,
    };

    let read_handle = handle.clone();
    let read_on_terminate = on_terminate.clone();
    let read_task = tokio::spawn(read_loop(
        reader,
        room_id.clone(),
        user_id.clone(),
        username.clone(),
        bus,
        topics,
        config.clone(),
        move || read_on_terminate(read_handle.clone()),
    ));

    let write_handle = handle.clone();
    let write_task = tokio::spawn(write_loop(writer, outbound_rx, config, move || {
        on_terminate(write_handle.clone())
    }));

    (handle, read_task, write_task)
}

async fn read_loop<R: FrameReader>(
    mut reader: R,
    room_id: String,
    sender_id: String,
    sender_name: String,
    bus: Arc<dyn EventBus>,
    topics: TopicFormatter,
    config: Config,
    on_terminate: impl Fn(),
) {
    loop {
        let frame = match timeout(config.read_deadline, reader.read()).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(_)) | Err(_) => break,
        };

        match frame {
            RawFrame::Close => break,
            RawFrame::Ping | RawFrame::Pong => continue,
            RawFrame::Text(content) => {
                if content.len() > config.max_message_bytes {
                    break;
                }
                if is_heartbeat_content(&content) {
                    // Heartbeat: the read deadline above already extended on this
                    // successful read, nothing further to do.
                    continue;
                }
                let message = ChatMessage {
                    id: 0,
                    room_id: room_id.clone(),
                    sender_id: sender_id.clone(),
                    sender: sender_name.clone(),
                    content,
                    timestamp: Utc::now(),
                };
                let topic = topics.message_new(&room_id);
                if let Err(e) = bus.publish(&topic, ChatEvent::MessageNew { message }).await {
                    eprintln!("session: failed to publish inbound message for room {room_id}: {e}");
                }
            }
        }
    }
    on_terminate();
}

async fn write_loop<W: FrameWriter>(
    mut writer: W,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    config: Config,
    on_terminate: impl Fn(),
) {
    let mut ticker = tokio::time::interval(config.ping_period());
    ticker.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                let Ok(text) = serde_json::to_string(&frame) else { continue };
                if timeout(config.write_deadline, writer.write(RawFrame::Text(text))).await.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if timeout(config.write_deadline, writer.write(RawFrame::Ping)).await.is_err() {
                    break;
                }
            }
        }
    }
    on_terminate();
}
