//! Transport layer for Tessera.
//!
//! Provides the [`Transport`] and [`MessageConnection`] traits that
//! abstract the persistent bidirectional message channel the coordinator
//! speaks over. The coordinator only ever sees whole byte frames; framing,
//! handshakes, and socket plumbing stay behind these traits.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Distinct from a participant id: one participant may hold several
/// connection ids over its lifetime as it disconnects and resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// The coordinator runs a single accept loop for the process lifetime,
/// so the trait is accept-only; closing individual connections is the
/// [`MessageConnection`]'s job.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: MessageConnection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection carrying whole message frames in both directions.
///
/// Sending and receiving are independent: a pending [`recv`] must never
/// block a concurrent [`send`] on the same connection, since the handler
/// pushes events out while it waits for the client's next action.
///
/// [`recv`]: MessageConnection::recv
/// [`send`]: MessageConnection::send
pub trait MessageConnection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
