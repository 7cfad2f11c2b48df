//! Room and game coordination for Tessera.
//!
//! A [`Lobby`] owns the set of live [`Room`]s. Participants join a room
//! by name (creating it on first use), the room owner starts a
//! [`GridGame`], and members take turns claiming tiles until one color
//! owns the four corners of a square. Every operation returns the
//! [`Event`]s it produced; an [`EventDispatcher`] carries them to the
//! connected participants.

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod event;
mod game;
mod lobby;
mod room;

pub use config::LobbyConfig;
pub use error::{PlaceError, RoomFull};
pub use event::{Event, EventDispatcher};
pub use game::{
    GamePhase, GridGame, PlaceOutcome, Placement, MAX_DIMENSION, MIN_DIMENSION,
};
pub use lobby::Lobby;
pub use room::{Room, Seat};
