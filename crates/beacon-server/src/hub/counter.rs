//! `RemoteIncrement` — fire-and-forget sample method.

use async_trait::async_trait;
use beacon_proto::{HubError, PushEvent, Signature};
use serde_json::Value;

use crate::rpc::context::HubContext;
use crate::rpc::registry::MethodHandler;
use crate::ws::broadcast::broadcast_others;

/// Event name pushed to every connection except the caller.
pub const REMOTE_INCREMENT: &str = "RemoteIncrement";

/// `RemoteIncrement() -> void`.
///
/// Pushes a `RemoteIncrement` event (no payload) to all connections except
/// the caller. Unreachable targets are already logged by the gateway.
pub struct RemoteIncrement;

#[async_trait]
impl MethodHandler for RemoteIncrement {
    fn signature(&self) -> Signature {
        Signature::empty()
    }

    async fn handle(&self, _args: Vec<Value>, ctx: &HubContext) -> Result<Value, HubError> {
        let event = PushEvent::new(REMOTE_INCREMENT, Vec::new());
        let _ = broadcast_others(&ctx.registry, &ctx.connection_id, &event);
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use crate::ws::connection::Connection;
    use crate::ws::registry::ConnectionRegistry;

    fn add_connection(
        registry: &ConnectionRegistry,
        id: &str,
    ) -> mpsc::Receiver<Arc<String>> {
        let (tx, rx) = mpsc::channel(32);
        registry
            .register(Arc::new(Connection::new(id.into(), tx)))
            .unwrap();
        rx
    }

    #[tokio::test]
    async fn pushes_to_everyone_but_the_caller() {
        let registry = Arc::new(ConnectionRegistry::new(8));
        let mut rx_a = add_connection(&registry, "a");
        let mut rx_b = add_connection(&registry, "b");
        let mut rx_c = add_connection(&registry, "c");

        let ctx = HubContext::new("a", registry);
        let result = RemoteIncrement.handle(Vec::new(), &ctx).await.unwrap();
        assert_eq!(result, Value::Null);

        assert!(rx_a.try_recv().is_err());
        for rx in [&mut rx_b, &mut rx_c] {
            let msg = rx.try_recv().unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
            assert_eq!(parsed["event"], REMOTE_INCREMENT);
            assert!(parsed.get("args").is_none());
        }
    }

    #[tokio::test]
    async fn sole_connection_pushes_nothing() {
        let registry = Arc::new(ConnectionRegistry::new(8));
        let mut rx_a = add_connection(&registry, "a");

        let ctx = HubContext::new("a", registry);
        RemoteIncrement.handle(Vec::new(), &ctx).await.unwrap();
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn unreachable_target_does_not_fail_the_call() {
        let registry = Arc::new(ConnectionRegistry::new(8));
        let _rx_a = add_connection(&registry, "a");
        let rx_b = add_connection(&registry, "b");
        let mut rx_c = add_connection(&registry, "c");
        drop(rx_b); // b's writer is gone

        let ctx = HubContext::new("a", registry);
        let result = RemoteIncrement.handle(Vec::new(), &ctx).await;
        assert!(result.is_ok());
        assert!(rx_c.try_recv().is_ok());
    }

    #[tokio::test]
    async fn declares_no_arguments() {
        let sig = RemoteIncrement.signature();
        assert_eq!(sig.arity(), 0);
        assert!(sig.check(&[serde_json::json!(1)]).is_err());
    }
}
