//! Frame types for the hub's JSON wire protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name pushed to a client once its connection is admitted.
///
/// Carries the assigned connection id as its single argument; the client
/// stub treats it as the handshake-complete signal.
pub const CONNECTION_ESTABLISHED: &str = "connection.established";

/// Inbound remote call from a client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Correlation id echoed on the reply. Absent for fire-and-forget
    /// invocations, which expect no reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Method name (e.g. `Greeting`).
    pub method: String,
    /// Ordered positional arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

/// Outbound reply to a correlated invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reply {
    /// Echoed correlation id.
    pub id: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload (present when `success == true`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload (present when `success == false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Structured error body inside a [`Reply`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. `UNKNOWN_METHOD`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Server-pushed event, not solicited by a correlated call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushEvent {
    /// Event name (e.g. `RemoteIncrement`).
    pub event: String,
    /// Ordered positional arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    /// ISO-8601 timestamp.
    pub timestamp: String,
}

/// Any frame a client can receive, for demultiplexing the read side.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Reply to a correlated invocation.
    Reply(Reply),
    /// Pushed event.
    Event(PushEvent),
}

impl Invocation {
    /// Build a correlated request/response invocation.
    pub fn call(id: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id: Some(id.into()),
            method: method.into(),
            args,
        }
    }

    /// Build a fire-and-forget invocation (no reply expected).
    pub fn notify(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id: None,
            method: method.into(),
            args,
        }
    }
}

impl Reply {
    /// Build a success reply.
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error reply.
    pub fn error(id: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            }),
        }
    }
}

impl PushEvent {
    /// Create a new event stamped with the current UTC time.
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Invocation ──────────────────────────────────────────────────

    #[test]
    fn call_carries_correlation_id() {
        let inv = Invocation::call("r1", "Greeting", vec![json!("John")]);
        assert_eq!(inv.id.as_deref(), Some("r1"));
        assert_eq!(inv.method, "Greeting");
        assert_eq!(inv.args, vec![json!("John")]);
    }

    #[test]
    fn notify_has_no_id_on_the_wire() {
        let inv = Invocation::notify("RemoteIncrement", Vec::new());
        let json = serde_json::to_string(&inv).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("args"));
        let back: Invocation = serde_json::from_str(&json).unwrap();
        assert!(back.id.is_none());
        assert!(back.args.is_empty());
    }

    #[test]
    fn wire_format_invocation() {
        let raw = r#"{"id": "r1", "method": "Greeting", "args": ["John"]}"#;
        let inv: Invocation = serde_json::from_str(raw).unwrap();
        assert_eq!(inv.id.as_deref(), Some("r1"));
        assert_eq!(inv.method, "Greeting");
        assert_eq!(inv.args[0], "John");
    }

    #[test]
    fn invocation_args_default_to_empty() {
        let raw = r#"{"method": "RemoteIncrement"}"#;
        let inv: Invocation = serde_json::from_str(raw).unwrap();
        assert!(inv.id.is_none());
        assert!(inv.args.is_empty());
    }

    // ── Reply ───────────────────────────────────────────────────────

    #[test]
    fn success_reply_has_no_error_field() {
        let reply = Reply::success("r1", json!("Hello, John"));
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("error"));
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["id"], "r1");
        assert_eq!(v["success"], true);
        assert_eq!(v["result"], "Hello, John");
    }

    #[test]
    fn error_reply_has_no_result_field() {
        let reply = Reply::error("r2", "UNKNOWN_METHOD", "no such method");
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("result"));
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "UNKNOWN_METHOD");
        assert_eq!(v["error"]["message"], "no such method");
        assert!(v["error"].get("details").is_none());
    }

    #[test]
    fn wire_format_error_reply() {
        let raw = r#"{"id": "r3", "success": false, "error": {"code": "ARGUMENT_MISMATCH", "message": "expected 1 argument(s), got 0"}}"#;
        let reply: Reply = serde_json::from_str(raw).unwrap();
        assert!(!reply.success);
        assert!(reply.result.is_none());
        assert_eq!(reply.error.unwrap().code, "ARGUMENT_MISMATCH");
    }

    // ── PushEvent ───────────────────────────────────────────────────

    #[test]
    fn event_new_sets_timestamp() {
        let ev = PushEvent::new("RemoteIncrement", Vec::new());
        assert_eq!(ev.event, "RemoteIncrement");
        assert!(!ev.timestamp.is_empty());
    }

    #[test]
    fn event_without_args_omits_field() {
        let ev = PushEvent::new("RemoteIncrement", Vec::new());
        let json = serde_json::to_string(&ev).unwrap();
        assert!(!json.contains("args"));
    }

    #[test]
    fn wire_format_event() {
        let raw = r#"{"event": "connection.established", "args": ["conn_1"], "timestamp": "2026-08-01T00:00:00.000Z"}"#;
        let ev: PushEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(ev.event, CONNECTION_ESTABLISHED);
        assert_eq!(ev.args[0], "conn_1");
    }

    // ── ServerMessage demultiplexing ────────────────────────────────

    #[test]
    fn server_message_reply_branch() {
        let raw = r#"{"id": "r1", "success": true, "result": 42}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::Reply(reply) => {
                assert_eq!(reply.id, "r1");
                assert_eq!(reply.result.unwrap(), 42);
            }
            ServerMessage::Event(_) => panic!("parsed a reply as an event"),
        }
    }

    #[test]
    fn server_message_event_branch() {
        let raw = r#"{"event": "RemoteIncrement", "timestamp": "2026-08-01T00:00:00.000Z"}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ServerMessage::Event(ev) => assert_eq!(ev.event, "RemoteIncrement"),
            ServerMessage::Reply(_) => panic!("parsed an event as a reply"),
        }
    }

    #[test]
    fn server_message_rejects_garbage() {
        assert!(serde_json::from_str::<ServerMessage>(r#"{"x": 1}"#).is_err());
    }
}
