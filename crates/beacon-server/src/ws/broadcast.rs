//! Event fan-out to a snapshot of target connections.

use std::sync::Arc;

use beacon_proto::PushEvent;
use tracing::{debug, warn};

use super::connection::{Connection, SendError};
use super::registry::ConnectionRegistry;

/// One target that could not be reached during a broadcast.
#[derive(Debug)]
pub struct DeliveryFailure {
    /// Target connection id.
    pub connection_id: String,
    /// Why the enqueue failed.
    pub reason: SendError,
}

/// Deliver `event` to every target connection.
///
/// The event is serialized once and enqueued on each target's own channel,
/// so each connection receives events in the order they were sent to it.
/// A target whose channel is closed or full is reported as a failure and
/// never prevents delivery to the rest.
pub fn broadcast(targets: &[Arc<Connection>], event: &PushEvent) -> Vec<DeliveryFailure> {
    let json = match serde_json::to_string(event) {
        Ok(json) => Arc::new(json),
        Err(e) => {
            warn!(event = %event.event, error = %e, "failed to serialize event");
            return Vec::new();
        }
    };
    debug!(event = %event.event, recipients = targets.len(), "broadcasting event");

    let mut failures = Vec::new();
    for conn in targets {
        if let Err(reason) = conn.send(json.clone()) {
            warn!(connection_id = %conn.id, %reason, "failed to enqueue event for client");
            failures.push(DeliveryFailure {
                connection_id: conn.id.clone(),
                reason,
            });
        }
    }
    failures
}

/// Deliver `event` to every connection currently registered except
/// `excluding` — the all-except-caller form used by hub methods.
///
/// The target set is computed at send time from the registry.
pub fn broadcast_others(
    registry: &ConnectionRegistry,
    excluding: &str,
    event: &PushEvent,
) -> Vec<DeliveryFailure> {
    broadcast(&registry.snapshot_others(excluding), event)
}
