//! WebSocket session lifecycle — one connected client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use beacon_proto::{errors, Invocation, LinkState, PushEvent, Reply, CONNECTION_ESTABLISHED};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::connection::Connection;
use crate::rpc::context::HubContext;
use crate::server::AppState;

/// Outbound queue depth per connection.
const OUTBOUND_BUFFER: usize = 256;

/// WebSocket close code sent when the registry refuses a connection.
const CLOSE_TRY_AGAIN_LATER: u16 = 1013;

/// Run the session for one upgraded WebSocket.
///
/// 1. Registers the connection (a full registry refuses with a close frame)
/// 2. Pushes `connection.established` with the assigned connection id
/// 3. Spawns a writer task draining the outbound queue and pinging the
///    client; unresponsive clients are disconnected
/// 4. Dispatches each inbound invocation on its own task, so a slow handler
///    blocks neither this connection's later calls nor other connections
/// 5. Unregisters on every exit path; errors end only this session
#[instrument(skip_all, fields(connection_id))]
pub async fn run_session(ws: WebSocket, state: AppState) {
    let connection_id = format!("conn_{}", Uuid::now_v7().simple());
    let _ = tracing::Span::current().record("connection_id", connection_id.as_str());

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(OUTBOUND_BUFFER);
    let connection = Arc::new(Connection::new(connection_id.clone(), send_tx));

    let mut ws = ws;
    if let Err(err) = state.registry.register(connection.clone()) {
        warn!(error = %err, "connection refused");
        counter!("hub_connections_refused_total").increment(1);
        let _ = ws
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_TRY_AGAIN_LATER,
                reason: err.code().into(),
            })))
            .await;
        return;
    }

    let connection_start = std::time::Instant::now();
    info!("client connected");
    counter!("hub_connections_total").increment(1);
    gauge!("hub_connections_active").increment(1.0);

    let (mut ws_tx, mut ws_rx) = ws.split();

    // Handshake-complete signal; the client stub waits for this event.
    let hello = PushEvent::new(CONNECTION_ESTABLISHED, vec![json!(connection_id)]);
    if let Ok(json) = serde_json::to_string(&hello) {
        let _ = ws_tx.send(Message::Text(json.into())).await;
    }

    // Writer: forwards queued messages and sends periodic pings.
    let ping_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let pong_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);
    let writer_conn = connection.clone();
    let writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ticker.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !writer_conn.check_alive()
                        && writer_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!(connection_id = %writer_conn.id, "client unresponsive, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Inbound loop; a server shutdown also ends the session.
    let shutdown = state.shutdown.token();
    loop {
        let msg = tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(msg)) => msg,
                Some(Err(_)) | None => break,
            },
            () = shutdown.cancelled() => {
                debug!("server shutting down, closing session");
                break;
            }
        };

        let text = match msg {
            Message::Text(ref text) => Some(text.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_owned()),
                Err(_) => {
                    info!(len = data.len(), "ignoring non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };
        let Some(text) = text else { continue };

        let conn = connection.clone();
        let methods = state.methods.clone();
        let ctx = HubContext::new(connection_id.clone(), state.registry.clone());
        drop(tokio::spawn(async move {
            let reply = match serde_json::from_str::<Invocation>(&text) {
                Ok(invocation) => methods.dispatch(invocation, &ctx).await,
                Err(e) => {
                    warn!(connection_id = %ctx.connection_id, "received malformed invocation frame");
                    Some(Reply::error(
                        "unknown",
                        errors::ARGUMENT_MISMATCH,
                        format!("malformed invocation: {e}"),
                    ))
                }
            };
            if let Some(reply) = reply {
                match serde_json::to_string(&reply) {
                    Ok(json) => {
                        if let Err(err) = conn.send(Arc::new(json)) {
                            debug!(connection_id = %conn.id, %err, "failed to enqueue reply");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "failed to serialize reply"),
                }
            }
        }));
    }

    // Tear down; only this session is affected.
    connection.set_state(LinkState::Closing);
    state.registry.unregister(&connection_id);
    writer.abort();
    info!("client disconnected");
    counter!("hub_disconnections_total").increment(1);
    gauge!("hub_connections_active").decrement(1.0);
    histogram!("hub_connection_duration_seconds").record(connection_start.elapsed().as_secs_f64());
}
