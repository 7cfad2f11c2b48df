//! Pluggable message codecs.
//!
//! The coordinator is codec-agnostic: anything that can turn the wire
//! types into bytes and back will do. [`JsonCodec`] is the default and the
//! only codec the stock server ships, living behind the `json` feature so
//! a custom deployment can swap it out without pulling in `serde_json`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ProtocolError;

/// Converts protocol values to and from raw bytes.
pub trait Codec: Send + Sync {
    /// Serialize a value into an outgoing frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parse an incoming frame into the expected type.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProtocolError>;
}

/// The default JSON codec. One JSON object per frame.
#[cfg(feature = "json")]
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}
