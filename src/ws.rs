//! WebSocket upgrade route. Thin adapter wiring a real `rocket_ws` duplex
//! connection to the transport-agnostic [`session`] read/write loops. Room
//! membership, user identity, and authentication all live upstream of this
//! module (see §1's scope note); this file owns only the socket-to-session
//! plumbing from the upgraded connection inward.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rocket::State;
use rocket::get;
use rocket_ws::{Message, WebSocket, result::Error as WsError, stream::DuplexStream};

use crate::bus::EventBus;
use crate::config::Config;
use crate::error::SessionError;
use crate::hub::Hub;
use crate::models::InboundFrame;
use crate::session::{FrameReader, FrameWriter, RawFrame, spawn_session};
use crate::topics::TopicFormatter;

struct WsReader {
    inner: SplitStream<DuplexStream>,
}

#[async_trait]
impl FrameReader for WsReader {
    async fn read(&mut self) -> Result<RawFrame, SessionError> {
        loop {
            return match self.inner.next().await {
                Some(Ok(Message::Text(text))) => {
                    let frame: InboundFrame = serde_json::from_str(&text).map_err(|e| SessionError::Decode(e.to_string()))?;
                    Ok(RawFrame::Text(frame.content))
                }
                Some(Ok(Message::Binary(_))) => Err(SessionError::Decode("binary frames are not supported".to_string())),
                Some(Ok(Message::Ping(_))) => Ok(RawFrame::Ping),
                Some(Ok(Message::Pong(_))) => Ok(RawFrame::Pong),
                Some(Ok(Message::Close(_))) | None => Ok(RawFrame::Close),
                Some(Ok(Message::Frame(_))) => continue,
                Some(Err(e)) => Err(SessionError::Io(e.to_string())),
            };
        }
    }
}

struct WsWriter {
    inner: SplitSink<DuplexStream, Message>,
}

#[async_trait]
impl FrameWriter for WsWriter {
    async fn write(&mut self, frame: RawFrame) -> Result<(), SessionError> {
        let message = match frame {
            RawFrame::Text(text) => Message::Text(text),
            RawFrame::Ping => Message::Ping(Vec::new()),
            RawFrame::Pong => Message::Pong(Vec::new()),
            RawFrame::Close => Message::Close(None),
        };
        self.inner.send(message).await.map_err(|e: WsError| SessionError::Io(e.to_string()))
    }
}

/// Upgrades to a duplex WebSocket and drives one session for its lifetime.
/// `room_id` is the path segment; `user_id`/`username` are supplied by
/// whatever sits upstream of this core (out of scope per §1 — this route
/// trusts them as already-authenticated).
#[get("/ws/<room_id>?<user_id>&<username>")]
pub fn connect(
    ws: WebSocket,
    room_id: String,
    user_id: String,
    username: String,
    hub: &State<Arc<Hub>>,
    bus: &State<Arc<dyn EventBus>>,
    topics: &State<TopicFormatter>,
    config: &State<Config>,
) -> rocket_ws::Channel<'static> {
    let hub = hub.inner().clone();
    let bus = bus.inner().clone();
    let topics = topics.inner().clone();
    let config = config.inner().clone();

    ws.channel(move |stream| async move {
        let (sink, source) = stream.split();
        let reader = WsReader { inner: source };
        let writer = WsWriter { inner: sink };

        let room = hub.get_or_create_room(&room_id).await;

        let terminate_hub = hub.clone();
        let (handle, read_task, write_task) = spawn_session(
            reader,
            writer,
            room_id.clone(),
            user_id.clone(),
            username.clone(),
            bus,
            topics,
            config,
            move |handle| {
                let hub = terminate_hub.clone();
                tokio::spawn(async move {
                    if let Some(room) = hub.find_room(&handle.room_id).await {
                        room.remove_client(&handle.user_id).await;
                    }
                });
            },
        );
        room.add_client(handle).await;

        // Hold the connection open until both tasks observe teardown; dropping
        // either split half early would close the socket out from under them.
        let _ = read_task.await;
        let _ = write_task.await;
        Ok(())
    })
}
