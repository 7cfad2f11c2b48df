//! Protocol error types.

use thiserror::Error;

/// Errors arising while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A value could not be serialized into a frame.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// A frame could not be parsed into the expected type.
    #[error("failed to decode message: {0}")]
    Decode(String),
}
