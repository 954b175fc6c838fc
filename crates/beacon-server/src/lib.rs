//! # beacon-server
//!
//! The hub: connection registry, method dispatch, and event fan-out over
//! WebSocket.
//!
//! - Connection registry: bounded, single-owner membership tracking
//! - Hub dispatcher: signature-checked async method dispatch
//! - Broadcast gateway: serialize-once fan-out with isolated per-target
//!   failures
//! - HTTP surface: `/health` and the `/hub` WebSocket upgrade path
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod hub;
pub mod rpc;
pub mod server;
pub mod shutdown;
pub mod ws;
