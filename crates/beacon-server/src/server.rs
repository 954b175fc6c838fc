//! `HubServer` — axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::{Json, Response};
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::rpc::registry::MethodRegistry;
use crate::shutdown::ShutdownCoordinator;
use crate::ws::registry::ConnectionRegistry;
use crate::ws::session::run_session;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Hub method registry.
    pub methods: Arc<MethodRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
}

/// The hub server.
pub struct HubServer {
    config: Arc<ServerConfig>,
    methods: Arc<MethodRegistry>,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl HubServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, methods: MethodRegistry) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.max_connections));
        Self {
            config: Arc::new(config),
            methods: Arc::new(methods),
            registry,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            methods: self.methods.clone(),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/hub", get(hub_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve. Port `0` auto-assigns; returns the bound address
    /// and the serve task, which exits on graceful shutdown.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind(format!("{}:{}", self.config.host, self.config.port))
                .await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });
        info!(%addr, "hub listening");
        Ok((addr, handle))
    }

    /// Get the connection registry.
    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the hub method registry.
    pub fn methods(&self) -> &Arc<MethodRegistry> {
        &self.methods
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time, state.registry.count()))
}

/// GET /hub — WebSocket upgrade at the hub's well-known path.
async fn hub_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_session(socket, state))
}
