//! The hub client: connect, invoke, and receive pushed events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use beacon_proto::{ErrorBody, Invocation, LinkState, ServerMessage, CONNECTION_ESTABLISHED};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ClientError;

/// How long to wait for the hub's `connection.established` event.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound queue depth.
const OUTBOUND_BUFFER: usize = 64;

/// How long `disconnect` waits for the peer to answer the close.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Handler invoked for each occurrence of a pushed event.
///
/// Runs on the client's reader task; no thread or task affinity is
/// guaranteed for it.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// State shared between the client handle and its reader task.
struct Shared {
    state: Mutex<LinkState>,
    pending: Mutex<HashMap<String, oneshot::Sender<Result<Value, ClientError>>>>,
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    closed: CancellationToken,
}

impl Shared {
    fn new(state: LinkState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            pending: Mutex::new(HashMap::new()),
            handlers: Mutex::new(HashMap::new()),
            closed: CancellationToken::new(),
        })
    }
}

/// One client's view of its hub connection.
///
/// The link follows `idle → connecting → open → closing → closed`;
/// [`HubClient::connect`] covers the first three steps and every
/// constructed client starts `Open`. `Closed` is terminal.
pub struct HubClient {
    shared: Arc<Shared>,
    connection_id: String,
    out_tx: mpsc::Sender<Message>,
    reader: JoinHandle<()>,
}

impl HubClient {
    /// Connect to a hub and complete the handshake.
    ///
    /// Resolves once the hub pushes `connection.established`; a refusal
    /// (e.g. a full hub closing the socket) or a handshake timeout fails
    /// with [`ClientError::Handshake`].
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _response) = connect_async(url).await?;
        let (mut sink, mut stream) = ws.split();

        let connection_id =
            match tokio::time::timeout(HANDSHAKE_TIMEOUT, wait_established(&mut stream)).await {
                Ok(result) => result?,
                Err(_elapsed) => {
                    return Err(ClientError::Handshake {
                        message: "timed out waiting for connection.established".into(),
                    });
                }
            };

        let shared = Shared::new(LinkState::Open);

        let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);
        drop(tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
        }));

        let reader_shared = shared.clone();
        let reader = tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => route_frame(&reader_shared, &text),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            close_link(&reader_shared);
        });

        debug!(connection_id, "hub connection established");
        Ok(Self {
            shared,
            connection_id,
            out_tx,
            reader,
        })
    }

    /// The id the hub assigned to this connection.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        *self.shared.state.lock()
    }

    /// Send a request/response invocation and wait for the reply.
    ///
    /// Resolves with the hub's result, [`ClientError::Remote`] for an error
    /// reply, or [`ClientError::Disconnected`] if the link drops first.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, ClientError> {
        self.ensure_open()?;

        let id = Uuid::now_v7().to_string();
        let (tx, rx) = oneshot::channel();
        let _ = self.shared.pending.lock().insert(id.clone(), tx);

        let frame = encode(&Invocation::call(id.clone(), method, args))?;
        if self.out_tx.send(frame).await.is_err() {
            let _ = self.shared.pending.lock().remove(&id);
            return Err(ClientError::Disconnected);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Disconnected),
        }
    }

    /// Send a fire-and-forget invocation. No reply is expected.
    pub async fn send(&self, method: &str, args: Vec<Value>) -> Result<(), ClientError> {
        self.ensure_open()?;
        let frame = encode(&Invocation::notify(method, args))?;
        self.out_tx
            .send(frame)
            .await
            .map_err(|_| ClientError::Disconnected)
    }

    /// Register a handler for a pushed event.
    ///
    /// Handlers for the same event name run in registration order.
    pub fn on(&self, event: &str, handler: impl Fn(&[Value]) + Send + Sync + 'static) {
        let mut handlers = self.shared.handlers.lock();
        handlers
            .entry(event.to_owned())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Remove all handlers registered for an event name.
    pub fn off(&self, event: &str) {
        let _ = self.shared.handlers.lock().remove(event);
    }

    /// Close the link.
    ///
    /// Sends a close frame and waits (bounded) for the peer to answer;
    /// afterwards the link is `Closed` and every subsequent `invoke` or
    /// `send` fails with [`ClientError::Disconnected`].
    pub async fn disconnect(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.can_transition_to(LinkState::Closing) {
                return;
            }
            *state = LinkState::Closing;
        }

        let _ = self.out_tx.send(Message::Close(None)).await;

        // The reader finishes the link when the peer answers; force the
        // terminal state if it never does.
        if tokio::time::timeout(CLOSE_GRACE, self.shared.closed.cancelled())
            .await
            .is_err()
        {
            close_link(&self.shared);
        }
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.state().is_open() {
            Ok(())
        } else {
            Err(ClientError::Disconnected)
        }
    }
}

impl Drop for HubClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Encode an invocation as a WebSocket text frame.
fn encode(invocation: &Invocation) -> Result<Message, ClientError> {
    serde_json::to_string(invocation)
        .map(Message::text)
        .map_err(|e| ClientError::Protocol {
            message: e.to_string(),
        })
}

/// Read frames until the hub pushes `connection.established`.
async fn wait_established(stream: &mut SplitStream<WsStream>) -> Result<String, ClientError> {
    while let Some(msg) = stream.next().await {
        match msg? {
            Message::Text(text) => {
                if let Ok(ServerMessage::Event(event)) = serde_json::from_str(&text) {
                    if event.event == CONNECTION_ESTABLISHED {
                        let id = event
                            .args
                            .first()
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_owned();
                        return Ok(id);
                    }
                }
            }
            Message::Close(frame) => {
                // A refusal (e.g. full hub) closes before establishing
                let message = frame
                    .map(|f| f.reason.to_string())
                    .filter(|reason| !reason.is_empty())
                    .unwrap_or_else(|| "connection refused".into());
                return Err(ClientError::Handshake { message });
            }
            _ => {}
        }
    }
    Err(ClientError::Handshake {
        message: "connection closed before it was established".into(),
    })
}

/// Route one inbound frame: replies resolve pending invocations, events run
/// their registered handlers in order.
fn route_frame(shared: &Shared, raw: &str) {
    match serde_json::from_str::<ServerMessage>(raw) {
        Ok(ServerMessage::Reply(reply)) => {
            let sender = shared.pending.lock().remove(&reply.id);
            let Some(tx) = sender else {
                debug!(id = %reply.id, "reply with no pending invocation");
                return;
            };
            let result = if reply.success {
                Ok(reply.result.unwrap_or(Value::Null))
            } else {
                let body = reply.error.unwrap_or_else(|| ErrorBody {
                    code: beacon_proto::errors::REMOTE_ERROR.to_owned(),
                    message: "call failed".into(),
                    details: None,
                });
                Err(ClientError::Remote {
                    code: body.code,
                    message: body.message,
                })
            };
            let _ = tx.send(result);
        }
        Ok(ServerMessage::Event(event)) => {
            // Snapshot under the lock, invoke outside it, so a handler may
            // safely register or remove handlers itself.
            let snapshot: Vec<EventHandler> = shared
                .handlers
                .lock()
                .get(&event.event)
                .cloned()
                .unwrap_or_default();
            for handler in snapshot {
                handler(&event.args);
            }
        }
        Err(_) => debug!("ignoring unrecognized frame"),
    }
}

/// Finish the link: terminal state, pending invocations fail with
/// `Disconnected`, and the close signal fires. Idempotent.
fn close_link(shared: &Shared) {
    {
        let mut state = shared.state.lock();
        if state.can_transition_to(LinkState::Closed) {
            *state = LinkState::Closed;
        }
    }
    let drained: Vec<_> = {
        let mut pending = shared.pending.lock();
        pending.drain().collect()
    };
    for (_, tx) in drained {
        let _ = tx.send(Err(ClientError::Disconnected));
    }
    shared.closed.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_shared() -> Arc<Shared> {
        Shared::new(LinkState::Open)
    }

    fn reply_frame(id: &str, result: Value) -> String {
        serde_json::to_string(&beacon_proto::Reply::success(id, result)).unwrap()
    }

    fn event_frame(event: &str, args: Vec<Value>) -> String {
        serde_json::to_string(&beacon_proto::PushEvent::new(event, args)).unwrap()
    }

    #[tokio::test]
    async fn reply_resolves_pending_invocation() {
        let shared = make_shared();
        let (tx, rx) = oneshot::channel();
        let _ = shared.pending.lock().insert("r1".into(), tx);

        route_frame(&shared, &reply_frame("r1", json!("Hello, John")));

        assert_eq!(rx.await.unwrap().unwrap(), "Hello, John");
        assert!(shared.pending.lock().is_empty());
    }

    #[tokio::test]
    async fn error_reply_resolves_as_remote_error() {
        let shared = make_shared();
        let (tx, rx) = oneshot::channel();
        let _ = shared.pending.lock().insert("r2".into(), tx);

        let frame = serde_json::to_string(&beacon_proto::Reply::error(
            "r2",
            "UNKNOWN_METHOD",
            "method 'NoSuch' is not registered",
        ))
        .unwrap();
        route_frame(&shared, &frame);

        match rx.await.unwrap() {
            Err(ClientError::Remote { code, message }) => {
                assert_eq!(code, "UNKNOWN_METHOD");
                assert!(message.contains("NoSuch"));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn reply_without_pending_invocation_is_ignored() {
        let shared = make_shared();
        route_frame(&shared, &reply_frame("ghost", json!(null)));
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let shared = make_shared();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            let handler: EventHandler = Arc::new(move |_args| order.lock().push(i));
            shared
                .handlers
                .lock()
                .entry("RemoteIncrement".into())
                .or_default()
                .push(handler);
        }

        route_frame(&shared, &event_frame("RemoteIncrement", Vec::new()));
        route_frame(&shared, &event_frame("RemoteIncrement", Vec::new()));

        assert_eq!(*order.lock(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn handler_receives_event_args() {
        let shared = make_shared();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let handler: EventHandler = Arc::new(move |args| seen2.lock().extend(args.to_vec()));
        shared
            .handlers
            .lock()
            .entry("tick".into())
            .or_default()
            .push(handler);

        route_frame(&shared, &event_frame("tick", vec![json!(7)]));

        assert_eq!(*seen.lock(), vec![json!(7)]);
    }

    #[test]
    fn unrelated_events_do_not_fire_handlers() {
        let shared = make_shared();
        let fired = Arc::new(Mutex::new(0_u32));
        let fired2 = fired.clone();
        let handler: EventHandler = Arc::new(move |_| *fired2.lock() += 1);
        shared
            .handlers
            .lock()
            .entry("RemoteIncrement".into())
            .or_default()
            .push(handler);

        route_frame(&shared, &event_frame("SomethingElse", Vec::new()));

        assert_eq!(*fired.lock(), 0);
    }

    #[test]
    fn removing_handlers_stops_delivery() {
        let shared = make_shared();
        let fired = Arc::new(Mutex::new(0_u32));
        let fired2 = fired.clone();
        let handler: EventHandler = Arc::new(move |_| *fired2.lock() += 1);
        shared
            .handlers
            .lock()
            .entry("RemoteIncrement".into())
            .or_default()
            .push(handler);

        route_frame(&shared, &event_frame("RemoteIncrement", Vec::new()));
        let _ = shared.handlers.lock().remove("RemoteIncrement");
        route_frame(&shared, &event_frame("RemoteIncrement", Vec::new()));

        assert_eq!(*fired.lock(), 1);
    }

    #[test]
    fn garbage_frames_are_ignored() {
        let shared = make_shared();
        route_frame(&shared, "not json");
        route_frame(&shared, r#"{"neither": "reply nor event"}"#);
    }

    #[tokio::test]
    async fn close_link_drains_pending_and_is_terminal() {
        let shared = make_shared();
        let (tx, rx) = oneshot::channel();
        let _ = shared.pending.lock().insert("r1".into(), tx);

        close_link(&shared);

        assert!(matches!(
            rx.await.unwrap(),
            Err(ClientError::Disconnected)
        ));
        assert_eq!(*shared.state.lock(), LinkState::Closed);
        assert!(shared.closed.is_cancelled());

        // Idempotent
        close_link(&shared);
        assert_eq!(*shared.state.lock(), LinkState::Closed);
    }
}
