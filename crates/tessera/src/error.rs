//! Unified error type for the Tessera server.

use tessera_protocol::ProtocolError;
use tessera_session::RegistryError;
use tessera_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tessera` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (identification).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
