//! Wire protocol for Tessera.
//!
//! Defines the actions clients send, the events the coordinator answers
//! with, and the codec boundary that turns both into bytes. The other
//! crates in the workspace speak exclusively in these types; nothing
//! outside this crate knows what the frames look like on the wire.

pub mod codec;
pub mod error;
pub mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientRequest, Color, GameSnapshot, OwnedCell, ParticipantId, ParticipantInfo, RoomKey,
    RoomSummary, ServerEvent,
};
