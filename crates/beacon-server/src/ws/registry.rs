//! Connection registry — the single source of truth for who is connected.

use std::collections::HashMap;
use std::sync::Arc;

use beacon_proto::{HubError, LinkState};
use parking_lot::Mutex;
use tracing::debug;

use super::connection::Connection;

/// Tracks the set of currently open connections and bounds their number.
///
/// Membership is reachable only through these operations; mutations and
/// snapshots are mutually exclusive under a single lock, so a broadcast
/// snapshot never observes a connection mid-removal.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Arc<Connection>>>,
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Create a registry bounded to `max_connections`.
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            max_connections,
        }
    }

    /// Admit a connection and mark it open.
    ///
    /// The only failure is resource exhaustion: when the registry already
    /// holds `max_connections` entries the connection is refused.
    pub fn register(&self, connection: Arc<Connection>) -> Result<(), HubError> {
        let mut conns = self.connections.lock();
        if conns.len() >= self.max_connections {
            return Err(HubError::CapacityExceeded {
                limit: self.max_connections,
            });
        }
        connection.set_state(LinkState::Open);
        debug!(connection_id = %connection.id, total = conns.len() + 1, "connection registered");
        let _ = conns.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Remove a connection and mark it closed.
    ///
    /// Idempotent: unregistering an id that is not present is a no-op.
    pub fn unregister(&self, id: &str) {
        let mut conns = self.connections.lock();
        if let Some(conn) = conns.remove(id) {
            conn.set_state(LinkState::Closed);
            debug!(connection_id = %id, total = conns.len(), "connection unregistered");
        }
    }

    /// Point-in-time view of every connection except `excluding`.
    pub fn snapshot_others(&self, excluding: &str) -> Vec<Arc<Connection>> {
        self.connections
            .lock()
            .values()
            .filter(|conn| conn.id != excluding)
            .cloned()
            .collect()
    }

    /// Number of currently open connections.
    pub fn count(&self) -> usize {
        self.connections.lock().len()
    }
}
