//! `Greeting` — request/response sample method.

use std::time::Duration;

use async_trait::async_trait;
use beacon_proto::{ArgKind, HubError, Signature};
use serde_json::{json, Value};

use crate::rpc::context::HubContext;
use crate::rpc::registry::MethodHandler;

/// `Greeting(name: string) -> string`.
///
/// Returns `"Hello, {name}"` after an artificial delay. The delay simulates
/// a slow backend call; dispatch runs it on its own task, so it never holds
/// up any other invocation.
pub struct Greeting {
    delay: Duration,
}

impl Greeting {
    /// Create the handler with the configured artificial delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl MethodHandler for Greeting {
    fn signature(&self) -> Signature {
        Signature::new([ArgKind::String])
    }

    async fn handle(&self, args: Vec<Value>, _ctx: &HubContext) -> Result<Value, HubError> {
        let name = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| HubError::ArgumentMismatch {
                message: "'name' must be a string".into(),
            })?;
        let greeting = format!("Hello, {name}");
        tokio::time::sleep(self.delay).await;
        Ok(json!(greeting))
    }
}
