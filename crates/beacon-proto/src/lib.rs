//! # beacon-proto
//!
//! Wire-format types for the beacon hub protocol.
//!
//! - Frames: [`Invocation`] (client → server), [`Reply`] and [`PushEvent`]
//!   (server → client), plus the [`ServerMessage`] union for demultiplexing
//! - Error codes and the [`HubError`] type
//! - Per-method argument signatures ([`Signature`])
//! - The link lifecycle state machine ([`LinkState`]), mirrored by both ends

#![deny(unsafe_code)]

pub mod errors;
pub mod signature;
pub mod state;
pub mod types;

pub use errors::HubError;
pub use signature::{ArgKind, Signature};
pub use state::LinkState;
pub use types::{ErrorBody, Invocation, PushEvent, Reply, ServerMessage, CONNECTION_ESTABLISHED};
