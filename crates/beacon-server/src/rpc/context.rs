//! Per-invocation handler context.

use std::sync::Arc;

use crate::ws::registry::ConnectionRegistry;

/// Context a hub method executes in: the originating connection and the
/// shared connection registry for broadcast addressing.
#[derive(Clone)]
pub struct HubContext {
    /// Id of the connection the invocation arrived on.
    pub connection_id: String,
    /// Shared connection registry.
    pub registry: Arc<ConnectionRegistry>,
}

impl HubContext {
    /// Build a context for an invocation from `connection_id`.
    pub fn new(connection_id: impl Into<String>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            connection_id: connection_id.into(),
            registry,
        }
    }
}
