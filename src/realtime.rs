use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::feed::FeedEvent;
use crate::models::{entity_id, field, Comment, Reply};

/// The single shared topic all comment events are broadcast on.
pub const TOPIC: &str = "comments";

const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unsubscribed,
    Connecting,
    Subscribed,
    Errored,
}

/// Decode one push frame into the store's operation vocabulary. Anything
/// unrecognized or malformed yields `None`: the realtime channel is a
/// best-effort enhancement and never produces a user-visible error.
pub fn decode_event(frame: &str) -> Option<FeedEvent> {
    let v: Value = serde_json::from_str(frame).ok()?;
    let name = v.get("event")?.as_str()?;
    let data = v.get("data").unwrap_or(&Value::Null);
    match name {
        "comment:created" => Comment::from_value(data).map(FeedEvent::Created),
        "comment:updated" => Comment::from_value(data).map(FeedEvent::Updated),
        "comment:deleted" => {
            // bare identifier or an object wrapping one
            entity_id(data).map(|comment_id| FeedEvent::Deleted { comment_id })
        }
        "comment:liked" | "comment:disliked" => reaction_event(data),
        "comment:reply-added" => reply_event(data),
        _ => None,
    }
}

/// A reaction push carries either the full updated comment or counters
/// only. Counters are preferred whenever the payload has no body text, so a
/// slim frame can never clobber concurrently-edited content.
fn reaction_event(data: &Value) -> Option<FeedEvent> {
    if field(data, &["content", "text"]).is_some() {
        if let Some(comment) = Comment::from_value(data) {
            return Some(FeedEvent::Updated(comment));
        }
    }
    let like_count = field(data, &["likeCount", "like_count"]).and_then(Value::as_u64);
    let dislike_count = field(data, &["dislikeCount", "dislike_count"]).and_then(Value::as_u64);
    if let (Some(comment_id), Some(like_count), Some(dislike_count)) =
        (entity_id(data), like_count, dislike_count)
    {
        return Some(FeedEvent::ReactionCounts {
            comment_id,
            like_count,
            dislike_count,
        });
    }
    Comment::from_value(data).map(FeedEvent::Updated)
}

/// A reply push is either `{reply, parentCommentId}` or a bare reply with an
/// embedded parent reference.
fn reply_event(data: &Value) -> Option<FeedEvent> {
    let (raw, parent_hint) = match data.get("reply") {
        Some(raw) => (
            raw,
            field(data, &["parentCommentId", "parentComment", "parent_id"]).and_then(entity_id),
        ),
        None => (data, None),
    };
    let reply = Reply::from_value_with_parent(raw, parent_hint.as_deref())?;
    Some(FeedEvent::ReplyAdded {
        parent_id: reply.parent_id.clone(),
        reply,
    })
}

/// Owns the push-channel subscription for one feed view: connection, topic
/// handshake, and the background read task. Dropping the listener (or
/// calling `shutdown`) releases the connection, so repeated mount/unmount
/// cycles cannot leak handlers.
pub struct RealtimeListener {
    state: Arc<Mutex<ListenerState>>,
    task: Option<JoinHandle<()>>,
    stop: Option<oneshot::Sender<()>>,
}

impl Default for RealtimeListener {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeListener {
    pub fn new() -> Self {
        RealtimeListener {
            state: Arc::new(Mutex::new(ListenerState::Unsubscribed)),
            task: None,
            stop: None,
        }
    }

    pub fn state(&self) -> ListenerState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: ListenerState) {
        *self.state.lock().unwrap() = state;
    }

    /// Connect, subscribe to the shared topic, and start forwarding decoded
    /// events. Without a credential the listener stays `Unsubscribed` for
    /// this view instance. Connection and handshake failures log and park in
    /// `Errored`; list fetches remain the source of truth.
    pub async fn subscribe(
        &mut self,
        url: &str,
        token: Option<&str>,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) {
        let Some(token) = token else {
            debug!("no session token, realtime updates disabled");
            return;
        };
        self.set_state(ListenerState::Connecting);
        let connect_url = format!("{url}?token={token}");
        let mut ws = match connect_async(&connect_url).await {
            Ok((ws, _resp)) => ws,
            Err(e) => {
                warn!("realtime connect failed: {e}");
                self.set_state(ListenerState::Errored);
                return;
            }
        };
        let subscribe = json!({ "action": "subscribe", "topic": TOPIC }).to_string();
        if let Err(e) = ws.send(Message::Text(subscribe)).await {
            warn!("realtime subscribe failed: {e}");
            self.set_state(ListenerState::Errored);
            return;
        }
        match tokio::time::timeout(SUBSCRIBE_TIMEOUT, wait_for_ack(&mut ws)).await {
            Ok(true) => {}
            _ => {
                warn!("subscription to '{TOPIC}' not acknowledged");
                self.set_state(ListenerState::Errored);
                let _ = ws.close(None).await;
                return;
            }
        }
        self.set_state(ListenerState::Subscribed);
        info!("subscribed to realtime topic '{TOPIC}'");

        let (stop_tx, stop_rx) = oneshot::channel();
        let state = Arc::clone(&self.state);
        self.task = Some(tokio::spawn(read_loop(ws, events, state, stop_rx)));
        self.stop = Some(stop_tx);
    }

    /// Tear down the subscription: stops the read task and waits for it to
    /// release the connection before returning, so no handler can fire
    /// against a torn-down store.
    pub async fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.set_state(ListenerState::Unsubscribed);
    }
}

impl Drop for RealtimeListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn wait_for_ack(ws: &mut WsStream) -> bool {
    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let ack = serde_json::from_str::<Value>(&text)
                    .ok()
                    .and_then(|v| v.get("event").and_then(Value::as_str).map(str::to_string));
                match ack.as_deref() {
                    Some("subscription:succeeded") => return true,
                    Some("subscription:error") => return false,
                    _ => debug!("ignoring pre-subscription frame"),
                }
            }
            Ok(Message::Close(_)) | Err(_) => return false,
            Ok(_) => {}
        }
    }
    false
}

async fn read_loop(
    mut ws: WsStream,
    events: mpsc::UnboundedSender<FeedEvent>,
    state: Arc<Mutex<ListenerState>>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut stop => break,
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => match decode_event(&text) {
                    Some(event) => {
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    None => debug!("dropping unrecognized realtime frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    warn!("realtime connection closed by server");
                    *state.lock().unwrap() = ListenerState::Errored;
                    break;
                }
                Some(Ok(_)) => {} // ping/pong/binary
                Some(Err(e)) => {
                    warn!("realtime transport error: {e}");
                    *state.lock().unwrap() = ListenerState::Errored;
                    break;
                }
            }
        }
    }
    let _ = ws.close(None).await;
}
