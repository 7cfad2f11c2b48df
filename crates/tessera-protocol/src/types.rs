//! Core wire types for the Tessera protocol.
//!
//! Everything a client and the coordinator exchange is defined here: the
//! inbound [`ClientRequest`] actions, the outbound [`ServerEvent`]s, and
//! the small value types they carry ([`ParticipantId`], [`RoomKey`],
//! [`Color`]).
//!
//! The wire format is internally tagged JSON with camelCase names, so a
//! frame reads like `{"action":"placeTile","x":1,"y":2}` on the way in and
//! `{"event":"placedTile","x":1,"y":2,"color":"red"}` on the way out.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant.
///
/// Newtype over `u64` so a participant id can never be confused with a
/// coordinate or a counter. Allocated by the registry; never reused within
/// a process. `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p-{}", self.0)
    }
}

/// The generated secret key of a room.
///
/// Issued when a room is created and handed out in `joinedRoom`. Leave
/// requests target the key rather than the human-readable name, so a
/// recreated room of the same name can never be left by accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(pub String);

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// A seat color from the fixed room palette.
///
/// Every member of a room holds exactly one palette color while seated;
/// the palette has ten entries, which is also the room capacity ceiling.
/// Serialized as the lowercase color name (`"red"`, `"grey"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Pink,
    Grey,
    Black,
    White,
}

impl Color {
    /// The full palette in allocation order. A joining participant gets
    /// the first entry not currently held by another member.
    pub const PALETTE: [Color; 10] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Orange,
        Color::Purple,
        Color::Pink,
        Color::Grey,
        Color::Black,
        Color::White,
    ];

    /// The lowercase wire name of the color.
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Grey => "grey",
            Color::Black => "black",
            Color::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Inbound actions
// ---------------------------------------------------------------------------

/// An action a client sends to the coordinator.
///
/// Internally tagged on `action`. Every action except `identify` requires
/// the connection to have identified first; unidentified actions are
/// dropped by the handler.
///
/// Grid dimensions and tile coordinates are signed on purpose: the
/// coordinator clamps sizes into range and bounds-checks placements, so a
/// hostile `{"sizeX":-5}` is data, not a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientRequest {
    /// Establish (or resume) an identity on this connection.
    ///
    /// A valid `resume_token` restores the previous participant, seat and
    /// all. Otherwise a fresh participant is allocated under `name` (or a
    /// generated guest name when absent).
    Identify {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        resume_token: Option<String>,
    },

    /// Join the room with this name, creating it if it does not exist.
    JoinRoom { room_name: String },

    /// Leave the room identified by this key.
    LeaveRoom { room_key: RoomKey },

    /// Start (or restart) the room's grid game. Owner only.
    StartGame { size_x: i32, size_y: i32 },

    /// Claim the tile at `(x, y)` in the running game.
    PlaceTile { x: i32, y: i32 },

    /// Ask for a summary of all live rooms.
    RoomList,
}

impl ClientRequest {
    /// The wire name of the action, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientRequest::Identify { .. } => "identify",
            ClientRequest::JoinRoom { .. } => "joinRoom",
            ClientRequest::LeaveRoom { .. } => "leaveRoom",
            ClientRequest::StartGame { .. } => "startGame",
            ClientRequest::PlaceTile { .. } => "placeTile",
            ClientRequest::RoomList => "roomList",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// A fellow room member as shown to a joiner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// The member's display name.
    pub name: String,
    /// The member's seat color.
    pub color: Color,
}

/// One owned cell in a game snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCell {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// A snapshot of a running game, sent inside `joinedRoom` so a rejoining
/// client can rebuild the board it left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub size_x: i32,
    pub size_y: i32,
    /// Every owned cell; unowned cells are implied.
    pub cells: Vec<OwnedCell>,
    /// The color whose turn it is.
    pub turn: Color,
}

/// A room summary row in the `roomList` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// The room's human-readable name.
    pub name: String,
    /// Number of seated members.
    pub members: usize,
    /// Maximum members allowed.
    pub capacity: usize,
    /// Whether a match is currently running.
    pub in_game: bool,
}

/// An event the coordinator sends to one or more participants.
///
/// Internally tagged on `event`. The tag names are the protocol's event
/// vocabulary; rejection events (`roomIsFull`, `notOwner`, `notYourTurn`,
/// `notInRoom`, `alreadyInRoom`, `gameAlreadyEnded`, `observer`,
/// `nameUnavailable`) are only ever addressed to the acting participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Identity established. Carries the secret resume token the client
    /// must persist to survive a reconnect, and the name it ended up with.
    Connected { resume_token: String, name: String },

    /// The requested name is held by another live participant.
    NameUnavailable,

    /// The targeted room has no free seat.
    RoomIsFull,

    /// The actor joined (or rejoined) a room.
    JoinedRoom {
        room_name: String,
        room_key: RoomKey,
        color: Color,
        other_participants: Vec<ParticipantInfo>,
        /// Present only while a match is running in the room.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game: Option<GameSnapshot>,
    },

    /// Another participant joined the actor's room.
    OtherJoinedRoom { name: String, color: Color },

    /// The actor left the room with this key.
    LeftRoom { room_key: RoomKey },

    /// Another participant left the actor's room.
    OtherLeftRoom { room_key: RoomKey, name: String },

    /// Only the room owner may start a game.
    NotOwner,

    /// A game started in the actor's room, with the clamped dimensions.
    StartGame { size_x: i32, size_y: i32 },

    /// It is now this color's turn.
    InformTurn { color: Color },

    /// A tile was claimed.
    PlacedTile { x: i32, y: i32, color: Color },

    /// The game ended with this color victorious.
    WinGame { color: Color },

    /// The actor placed out of turn.
    NotYourTurn,

    /// The actor is not in (that) room.
    NotInRoom,

    /// The actor is already seated in a different room.
    AlreadyInRoom,

    /// The actor placed into a game that already finished.
    GameAlreadyEnded,

    /// The actor holds a room seat but no slot in the running match, so
    /// it watches rather than plays. Sent to members who joined after
    /// the game started and tried to place.
    Observer,

    /// Summary of all live rooms.
    RoomList { rooms: Vec<RoomSummary> },
}

impl ServerEvent {
    /// The wire name of the event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::NameUnavailable => "nameUnavailable",
            ServerEvent::RoomIsFull => "roomIsFull",
            ServerEvent::JoinedRoom { .. } => "joinedRoom",
            ServerEvent::OtherJoinedRoom { .. } => "otherJoinedRoom",
            ServerEvent::LeftRoom { .. } => "leftRoom",
            ServerEvent::OtherLeftRoom { .. } => "otherLeftRoom",
            ServerEvent::NotOwner => "notOwner",
            ServerEvent::StartGame { .. } => "startGame",
            ServerEvent::InformTurn { .. } => "informTurn",
            ServerEvent::PlacedTile { .. } => "placedTile",
            ServerEvent::WinGame { .. } => "winGame",
            ServerEvent::NotYourTurn => "notYourTurn",
            ServerEvent::NotInRoom => "notInRoom",
            ServerEvent::AlreadyInRoom => "alreadyInRoom",
            ServerEvent::GameAlreadyEnded => "gameAlreadyEnded",
            ServerEvent::Observer => "observer",
            ServerEvent::RoomList { .. } => "roomList",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
