//! # Tessera
//!
//! A WebSocket coordinator for the Tessera tile game. Participants
//! identify over a persistent connection, gather in named rooms, and
//! take turns claiming grid tiles until one color owns all four corners
//! of a square.
//!
//! The layers live in their own crates (`tessera-transport`,
//! `tessera-protocol`, `tessera-session`, `tessera-lobby`); this crate
//! wires them into a runnable server.
//!
//! ```rust,ignore
//! use tessera::TesseraServer;
//!
//! let server = TesseraServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! ```

mod dispatch;
mod error;
mod handler;
mod server;

pub use dispatch::ChannelDispatcher;
pub use error::TesseraError;
pub use server::{TesseraServer, TesseraServerBuilder};

// The wire surface, re-exported so embedders and test clients need only
// this crate.
pub use tessera_lobby::LobbyConfig;
pub use tessera_protocol::{
    ClientRequest, Color, GameSnapshot, OwnedCell, ParticipantId, ParticipantInfo,
    RoomKey, RoomSummary, ServerEvent,
};
