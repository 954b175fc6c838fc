//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the hub server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat ping interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Heartbeat timeout in seconds (disconnect after this long without a pong).
    pub heartbeat_timeout_secs: u64,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Artificial delay of the sample `Greeting` method, in milliseconds.
    pub greeting_delay_ms: u64,
}

impl ServerConfig {
    /// The `Greeting` delay as a [`Duration`].
    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 64,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 64 * 1024,
            greeting_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_limits() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_connections, 64);
        assert_eq!(cfg.max_message_size, 64 * 1024);
    }

    #[test]
    fn default_heartbeat() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.heartbeat_interval_secs, 30);
        assert_eq!(cfg.heartbeat_timeout_secs, 90);
    }

    #[test]
    fn default_greeting_delay_is_one_second() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.greeting_delay(), Duration::from_secs(1));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.max_connections, cfg.max_connections);
        assert_eq!(back.greeting_delay_ms, cfg.greeting_delay_ms);
    }

    #[test]
    fn custom_values() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9220,
            max_connections: 2,
            greeting_delay_ms: 25,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.port, 9220);
        assert_eq!(cfg.max_connections, 2);
        assert_eq!(cfg.greeting_delay(), Duration::from_millis(25));
    }
}
