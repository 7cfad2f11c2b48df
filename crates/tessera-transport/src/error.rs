//! Error types for the transport layer.
//!
//! A cleanly closed connection is not an error; `recv` reports it as
//! `Ok(None)`. These variants cover the failures that remain.

/// Errors produced while accepting connections or moving frames.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The client connected but the WebSocket upgrade did not complete.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// A frame could not be written; the connection is unusable.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// A frame could not be read; the connection is unusable.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
