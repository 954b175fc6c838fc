//! Method registry and async dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beacon_proto::{HubError, Invocation, Reply, Signature};
use metrics::{counter, histogram};
use serde_json::Value;
use tracing::warn;

use crate::rpc::context::HubContext;

/// Trait implemented by every hub method handler.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Declared argument shape, validated before [`MethodHandler::handle`]
    /// runs. A mismatching invocation never reaches the handler.
    fn signature(&self) -> Signature;

    /// Execute the handler in the caller's context.
    async fn handle(&self, args: Vec<Value>, ctx: &HubContext) -> Result<Value, HubError>;
}

/// Registry mapping method names to handlers.
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a method name.
    pub fn register(&mut self, method: &str, handler: impl MethodHandler + 'static) {
        let _ = self.handlers.insert(method.to_owned(), Arc::new(handler));
    }

    /// Maximum time a single handler is allowed to run.
    const HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

    /// Dispatch an invocation in the context of its originating connection.
    ///
    /// Returns the reply for correlated invocations; fire-and-forget
    /// invocations (no correlation id) return `None` and have their
    /// failures logged instead.
    pub async fn dispatch(&self, invocation: Invocation, ctx: &HubContext) -> Option<Reply> {
        let Invocation { id, method, args } = invocation;
        counter!("hub_invocations_total", "method" => method.clone()).increment(1);

        let result = match self.handlers.get(&method) {
            None => Err(HubError::UnknownMethod {
                method: method.clone(),
            }),
            Some(handler) => match handler.signature().check(&args) {
                Err(err) => Err(err),
                Ok(()) => {
                    let start = std::time::Instant::now();
                    let result = match tokio::time::timeout(
                        Self::HANDLER_TIMEOUT,
                        handler.handle(args, ctx),
                    )
                    .await
                    {
                        Ok(inner) => inner,
                        Err(_elapsed) => {
                            tracing::error!(
                                method,
                                "handler timed out after {:?}",
                                Self::HANDLER_TIMEOUT
                            );
                            Err(HubError::Internal {
                                message: format!("handler for '{method}' timed out"),
                            })
                        }
                    };

                    let duration = start.elapsed();
                    histogram!("hub_invocation_duration_seconds", "method" => method.clone())
                        .record(duration.as_secs_f64());
                    if duration.as_secs() >= 5 {
                        warn!(
                            method,
                            duration_secs = duration.as_secs_f64(),
                            "slow invocation"
                        );
                    }
                    result
                }
            },
        };

        if let Err(err) = &result {
            counter!(
                "hub_invocation_errors_total",
                "method" => method.clone(),
                "error_type" => err.code().to_owned()
            )
            .increment(1);
        }

        match id {
            Some(id) => Some(match result {
                Ok(value) => Reply::success(id, value),
                Err(err) => Reply {
                    id,
                    success: false,
                    result: None,
                    error: Some(err.to_error_body()),
                },
            }),
            None => {
                if let Err(err) = result {
                    warn!(method, error = %err, "fire-and-forget invocation failed");
                }
                None
            }
        }
    }

    /// List all registered method names (sorted).
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check whether a method is registered.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}
