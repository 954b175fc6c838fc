//! # beacon-client
//!
//! Client stub for the beacon hub: invoke remote methods and receive pushed
//! events over a persistent WebSocket link.
//!
//! - [`HubClient::connect`] performs the handshake (waits for the hub's
//!   `connection.established` event)
//! - [`HubClient::invoke`] sends a correlated request and resolves with the
//!   reply; [`HubClient::send`] is the fire-and-forget form
//! - [`HubClient::on`] / [`HubClient::off`] manage pushed-event handlers,
//!   invoked in registration order
//! - [`HubClient::disconnect`] closes the link; `Closed` is terminal

#![deny(unsafe_code)]

pub mod client;
pub mod errors;

pub use client::HubClient;
pub use errors::ClientError;
