//! A room: named, keyed, and holding up to ten seated participants.
//!
//! `Room` is pure, synchronous state; all locking and event production
//! happen in the [`Lobby`](crate::Lobby) above it. The lobby wraps each
//! room in its own `tokio::sync::Mutex`, which is what serializes the
//! "one logical action at a time" rule per room.

use rand::Rng;
use tessera_protocol::{Color, ParticipantId, RoomKey, RoomSummary};
use tessera_session::Participant;

use crate::game::{GamePhase, GridGame};
use crate::RoomFull;

/// One occupied seat: who sits there and the palette color they hold.
#[derive(Debug, Clone)]
pub struct Seat {
    pub participant: Participant,
    pub color: Color,
}

/// A named room and everything in it.
///
/// Invariants: assigned colors are a duplicate-free subset of the
/// palette; the seat count never exceeds the capacity; the owner is the
/// first participant ever seated and is never reassigned; a retired room
/// seats nobody.
#[derive(Debug)]
pub struct Room {
    name: String,
    key: RoomKey,
    capacity: usize,
    seats: Vec<Seat>,
    owner: Option<ParticipantId>,
    game: Option<GridGame>,
    retired: bool,
}

impl Room {
    /// Creates an empty room with a freshly generated key.
    pub fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            key: generate_room_key(),
            capacity,
            seats: Vec::new(),
            owner: None,
            game: None,
            retired: false,
        }
    }

    /// The room's human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The room's generated secret key.
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Seats a participant and assigns the first unheld palette color.
    ///
    /// The first participant ever seated becomes the owner. Seating is
    /// idempotent: a participant already present just gets its existing
    /// color back, with nothing mutated.
    ///
    /// # Errors
    /// Returns [`RoomFull`] when every seat is taken, when the palette is
    /// exhausted (which bounds effective capacity at ten), or when the
    /// room is retired. Rejection mutates nothing.
    pub fn add_participant(&mut self, participant: &Participant) -> Result<Color, RoomFull> {
        if let Some(seat) = self.seat(participant.id) {
            return Ok(seat.color);
        }
        if self.retired || self.seats.len() >= self.capacity {
            return Err(RoomFull);
        }
        let color = Color::PALETTE
            .into_iter()
            .find(|c| self.seats.iter().all(|s| s.color != *c))
            .ok_or(RoomFull)?;

        if self.owner.is_none() {
            self.owner = Some(participant.id);
        }
        self.seats.push(Seat {
            participant: participant.clone(),
            color,
        });
        Ok(color)
    }

    /// Unseats a participant, releasing its color for the next joiner.
    ///
    /// Ownership is never reassigned: when the owner leaves a non-empty
    /// room, the room stays ownerless until it empties and dies. Returns
    /// `false` if the participant was not seated.
    pub fn remove_participant(&mut self, id: ParticipantId) -> bool {
        let before = self.seats.len();
        self.seats.retain(|s| s.participant.id != id);
        self.seats.len() != before
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.seats.iter().any(|s| s.participant.id == id)
    }

    /// The seat a participant holds, if any.
    pub fn seat(&self, id: ParticipantId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.participant.id == id)
    }

    /// All seats, in seating order.
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Every seat except the given participant's, in seating order.
    pub fn members_except(&self, id: ParticipantId) -> Vec<&Seat> {
        self.seats
            .iter()
            .filter(|s| s.participant.id != id)
            .collect()
    }

    /// Ids of every seated participant, in seating order.
    pub fn member_ids(&self) -> Vec<ParticipantId> {
        self.seats.iter().map(|s| s.participant.id).collect()
    }

    pub fn owner(&self) -> Option<ParticipantId> {
        self.owner
    }

    pub fn is_owner(&self, id: ParticipantId) -> bool {
        self.owner == Some(id)
    }

    /// Marks the room as dead. Set exactly once, by the lobby, when the
    /// last seat empties; a retired room accepts no further joins.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Starts a match, replacing any previous one.
    ///
    /// Dimensions are clamped, never rejected. The current seats, in
    /// seating order, become the turn order, so the first seat (the
    /// owner, unless they left and rejoined) moves first.
    pub fn start_game(&mut self, size_x: i32, size_y: i32) -> &GridGame {
        let turn_order = self
            .seats
            .iter()
            .map(|s| (s.participant.id, s.color))
            .collect();
        self.game.insert(GridGame::new(size_x, size_y, turn_order))
    }

    /// The room's game in any phase, if one was ever started.
    pub fn game(&self) -> Option<&GridGame> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut GridGame> {
        self.game.as_mut()
    }

    /// The room's game only while it is actually being played.
    pub fn running_game(&self) -> Option<&GridGame> {
        self.game
            .as_ref()
            .filter(|g| g.phase() == GamePhase::InProgress)
    }

    /// The wire-ready row for `roomList`.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            name: self.name.clone(),
            members: self.seats.len(),
            capacity: self.capacity,
            in_game: self.running_game().is_some(),
        }
    }
}

/// Generates a random 32-character hex key for a new room.
fn generate_room_key() -> RoomKey {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    RoomKey(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// =========================================================================
// Tests
// =========================================================================
