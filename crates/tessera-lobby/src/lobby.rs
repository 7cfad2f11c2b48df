//! The lobby: the index of live rooms and the producer of every event.
//!
//! All coordinator operations enter here. Each one resolves the acting
//! participant to a room, mutates under that room's lock, and returns the
//! ordered list of [`Event`]s describing what happened; the caller hands
//! the list to an [`EventDispatcher`](crate::EventDispatcher).
//!
//! # Concurrency note
//!
//! Every operation starts by taking a lock private to the acting
//! participant and holds it end to end, so two operations by the same
//! participant never interleave even when they arrive on different
//! connections (a resume takeover races the displaced connection's last
//! request against its successor's first). Under that lock, two kinds of
//! short locks, never held at the same time:
//!
//! - one index `Mutex` over the lookup maps (name to room cell, key to
//!   name, participant to room name), which serializes create-if-absent
//!   so a double-create race on one name resolves to a single room;
//! - one `Mutex` per room, which serializes all mutation of that room
//!   and its game, while operations on different rooms run in parallel.
//!
//! A room retired between the index lookup and the room lock is detected
//! under the room lock (`retired` flag) and the lookup retried, which
//! closes the join-vs-destroy race.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use tessera_protocol::{
    Color, ParticipantId, ParticipantInfo, RoomKey, RoomSummary, ServerEvent,
};
use tessera_session::Participant;

use crate::game::PlaceOutcome;
use crate::{Event, LobbyConfig, PlaceError, Room, RoomFull};

/// The room index and the coordination entry points.
pub struct Lobby {
    config: LobbyConfig,
    index: Mutex<LobbyIndex>,
    /// One operation lock per participant, created on first use and kept
    /// for the process lifetime, like the registry's records.
    actors: Mutex<HashMap<ParticipantId, Arc<Mutex<()>>>>,
}

#[derive(Default)]
struct LobbyIndex {
    /// Live rooms by name. Each cell is the room's own lock.
    rooms: HashMap<String, Arc<Mutex<Room>>>,
    /// Room key to room name, for leave targeting.
    keys: HashMap<RoomKey, String>,
    /// Which room each participant is seated in. At most one entry per
    /// participant.
    memberships: HashMap<ParticipantId, String>,
}

impl Lobby {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            index: Mutex::new(LobbyIndex::default()),
            actors: Mutex::new(HashMap::new()),
        }
    }

    /// The acting participant's operation lock.
    ///
    /// Held across a whole operation, it keeps the index and room
    /// critical sections of two operations by the same participant from
    /// interleaving. Without it, a successor connection's rejoin can slip
    /// between a displaced leave's seat removal and its membership
    /// removal, stranding a seat whose membership entry is gone.
    async fn actor_lock(&self, id: ParticipantId) -> Arc<Mutex<()>> {
        let mut actors = self.actors.lock().await;
        Arc::clone(
            actors
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Seats a participant in the named room, creating the room if it
    /// does not exist.
    ///
    /// - member of a different room: `alreadyInRoom` to the actor;
    /// - no free seat: `roomIsFull` to the actor;
    /// - already a member of this room: the resume path, re-sending
    ///   `joinedRoom` (with the board snapshot while a match runs) to
    ///   the actor only;
    /// - otherwise: `joinedRoom` to the joiner and `otherJoinedRoom` to
    ///   every prior member.
    pub async fn join_room(&self, participant: &Participant, room_name: &str) -> Vec<Event> {
        let _op = self.actor_lock(participant.id).await.lock_owned().await;
        loop {
            let cell = {
                let mut index = self.index.lock().await;
                if let Some(current) = index.memberships.get(&participant.id) {
                    if current != room_name {
                        tracing::debug!(
                            participant = %participant.id,
                            room = room_name,
                            current = %current,
                            "join rejected, already in another room"
                        );
                        return vec![Event::to(participant.id, ServerEvent::AlreadyInRoom)];
                    }
                }
                match index.rooms.get(room_name) {
                    Some(cell) => Arc::clone(cell),
                    None => {
                        let room = Room::new(room_name, self.config.room_capacity);
                        index.keys.insert(room.key().clone(), room_name.to_string());
                        let cell = Arc::new(Mutex::new(room));
                        index.rooms.insert(room_name.to_string(), Arc::clone(&cell));
                        tracing::info!(room = room_name, "room created");
                        cell
                    }
                }
            };

            let (events, seated) = {
                let mut room = cell.lock().await;
                if room.is_retired() {
                    // Lost a race against the room's destruction; the
                    // stale index entry is gone by the time we retry.
                    continue;
                }

                if let Some(color) = room.seat(participant.id).map(|s| s.color) {
                    tracing::debug!(
                        participant = %participant.id,
                        room = room.name(),
                        "re-joining own room"
                    );
                    (vec![joined_room_view(&room, participant.id, color)], false)
                } else {
                    match room.add_participant(participant) {
                        Err(RoomFull) => {
                            tracing::debug!(
                                participant = %participant.id,
                                room = room.name(),
                                "join rejected, room is full"
                            );
                            return vec![Event::to(participant.id, ServerEvent::RoomIsFull)];
                        }
                        Ok(color) => {
                            tracing::info!(
                                participant = %participant.id,
                                name = %participant.name,
                                room = room.name(),
                                %color,
                                members = room.len(),
                                "participant joined room"
                            );
                            let mut events =
                                vec![joined_room_view(&room, participant.id, color)];
                            let others: Vec<ParticipantId> = room
                                .members_except(participant.id)
                                .iter()
                                .map(|s| s.participant.id)
                                .collect();
                            if !others.is_empty() {
                                events.push(Event::broadcast(
                                    others,
                                    ServerEvent::OtherJoinedRoom {
                                        name: participant.name.clone(),
                                        color,
                                    },
                                ));
                            }
                            (events, true)
                        }
                    }
                }
            };

            if seated {
                let mut index = self.index.lock().await;
                index
                    .memberships
                    .insert(participant.id, room_name.to_string());
            }
            return events;
        }
    }

    /// Removes a participant from the room with the given key.
    ///
    /// An unknown key, or a key for a room the participant is not seated
    /// in, answers `notInRoom`. Otherwise the seat and its color are
    /// released, the leaver gets `leftRoom`, the remaining members get
    /// `otherLeftRoom`, and a room left empty is destroyed.
    pub async fn leave_room(&self, participant: &Participant, room_key: &RoomKey) -> Vec<Event> {
        let _op = self.actor_lock(participant.id).await.lock_owned().await;
        let cell = {
            let index = self.index.lock().await;
            let Some(room_name) = index.keys.get(room_key) else {
                tracing::debug!(participant = %participant.id, "leave rejected, unknown room key");
                return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
            };
            if index.memberships.get(&participant.id) != Some(room_name) {
                tracing::debug!(
                    participant = %participant.id,
                    room = %room_name,
                    "leave rejected, not a member of that room"
                );
                return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
            }
            match index.rooms.get(room_name) {
                Some(cell) => Arc::clone(cell),
                None => return vec![Event::to(participant.id, ServerEvent::NotInRoom)],
            }
        };

        let (events, emptied) = {
            let mut room = cell.lock().await;
            if !room.remove_participant(participant.id) {
                return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
            }
            tracing::info!(
                participant = %participant.id,
                name = %participant.name,
                room = room.name(),
                members = room.len(),
                "participant left room"
            );
            let mut events = vec![Event::to(
                participant.id,
                ServerEvent::LeftRoom { room_key: room_key.clone() },
            )];
            let rest = room.member_ids();
            if !rest.is_empty() {
                events.push(Event::broadcast(
                    rest,
                    ServerEvent::OtherLeftRoom {
                        room_key: room_key.clone(),
                        name: participant.name.clone(),
                    },
                ));
            }
            let emptied = room.is_empty();
            if emptied {
                room.retire();
            }
            (events, emptied)
        };

        {
            let mut index = self.index.lock().await;
            index.memberships.remove(&participant.id);
            if emptied {
                // The name still maps to the retired cell: a replacement
                // room under the same name can only be created after
                // this unlink.
                if let Some(name) = index.keys.remove(room_key) {
                    index.rooms.remove(&name);
                    tracing::info!(room = %name, "room destroyed");
                }
            }
        }
        events
    }

    /// Starts (or restarts) the match in the actor's current room.
    ///
    /// Only the room owner may start; dimensions are clamped, never
    /// rejected. Every member is told `startGame` with the clamped size,
    /// then `informTurn` for the first turn.
    pub async fn start_game(
        &self,
        participant: &Participant,
        size_x: i32,
        size_y: i32,
    ) -> Vec<Event> {
        let _op = self.actor_lock(participant.id).await.lock_owned().await;
        let Some(cell) = self.current_room_cell(participant.id).await else {
            tracing::debug!(participant = %participant.id, "startGame rejected, not in a room");
            return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
        };
        let mut room = cell.lock().await;
        if room.is_retired() || !room.contains(participant.id) {
            return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
        }
        if !room.is_owner(participant.id) {
            tracing::debug!(
                participant = %participant.id,
                room = room.name(),
                "startGame rejected, not the owner"
            );
            return vec![Event::to(participant.id, ServerEvent::NotOwner)];
        }

        let game = room.start_game(size_x, size_y);
        let (size_x, size_y) = game.size();
        let turn = game.turn_color();
        tracing::info!(room = room.name(), size_x, size_y, %turn, "game started");

        let members = room.member_ids();
        vec![
            Event::broadcast(members.clone(), ServerEvent::StartGame { size_x, size_y }),
            Event::broadcast(members, ServerEvent::InformTurn { color: turn }),
        ]
    }

    /// Claims a tile in the actor's current game.
    ///
    /// Accepted placements broadcast `placedTile` plus either `winGame`
    /// (terminal) or `informTurn` for the next turn. Placing out of turn
    /// answers `notYourTurn`; placing into a finished match answers
    /// `gameAlreadyEnded`; a member with no slot in the running match
    /// answers `observer`; an out-of-bounds or already-owned cell is
    /// dropped without any event.
    pub async fn place_tile(&self, participant: &Participant, x: i32, y: i32) -> Vec<Event> {
        let _op = self.actor_lock(participant.id).await.lock_owned().await;
        let Some(cell) = self.current_room_cell(participant.id).await else {
            tracing::debug!(participant = %participant.id, "placeTile rejected, not in a room");
            return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
        };
        let mut room = cell.lock().await;
        if room.is_retired() || !room.contains(participant.id) {
            return vec![Event::to(participant.id, ServerEvent::NotInRoom)];
        }
        let Some(game) = room.game_mut() else {
            tracing::debug!(
                participant = %participant.id,
                room = room.name(),
                "placeTile ignored, no game in room"
            );
            return Vec::new();
        };

        match game.place_tile(x, y, participant.id) {
            Ok(placement) => {
                let members = room.member_ids();
                let mut events = vec![Event::broadcast(
                    members.clone(),
                    ServerEvent::PlacedTile {
                        x: placement.x,
                        y: placement.y,
                        color: placement.color,
                    },
                )];
                match placement.outcome {
                    PlaceOutcome::Win(color) => {
                        tracing::info!(room = room.name(), %color, "game won");
                        events.push(Event::broadcast(members, ServerEvent::WinGame { color }));
                    }
                    PlaceOutcome::NextTurn(color) => {
                        events.push(Event::broadcast(
                            members,
                            ServerEvent::InformTurn { color },
                        ));
                    }
                }
                events
            }
            Err(PlaceError::OutOfTurn(_)) => {
                tracing::debug!(participant = %participant.id, "placeTile rejected, out of turn");
                vec![Event::to(participant.id, ServerEvent::NotYourTurn)]
            }
            Err(PlaceError::GameOver) => {
                tracing::debug!(participant = %participant.id, "placeTile rejected, game over");
                vec![Event::to(participant.id, ServerEvent::GameAlreadyEnded)]
            }
            Err(PlaceError::NotSeated) => {
                // A seat in the room but no slot in the match: joined
                // after the game started.
                tracing::debug!(
                    participant = %participant.id,
                    room = room.name(),
                    "placeTile rejected, observer of the running match"
                );
                vec![Event::to(participant.id, ServerEvent::Observer)]
            }
            Err(err @ (PlaceError::OutOfBounds | PlaceError::CellOwned)) => {
                // No corrective event exists for these; drop silently.
                tracing::debug!(participant = %participant.id, %err, "placeTile ignored");
                Vec::new()
            }
        }
    }

    /// A summary row per live room, sorted by name.
    pub async fn room_list(&self) -> Vec<RoomSummary> {
        let cells: Vec<Arc<Mutex<Room>>> = {
            let index = self.index.lock().await;
            index.rooms.values().cloned().collect()
        };
        let mut rooms = Vec::with_capacity(cells.len());
        for cell in cells {
            let room = cell.lock().await;
            if !room.is_retired() {
                rooms.push(room.summary());
            }
        }
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.index.lock().await.rooms.len()
    }

    /// The name of the room a participant is seated in, if any.
    pub async fn current_room(&self, id: ParticipantId) -> Option<String> {
        self.index.lock().await.memberships.get(&id).cloned()
    }

    async fn current_room_cell(&self, id: ParticipantId) -> Option<Arc<Mutex<Room>>> {
        let index = self.index.lock().await;
        let name = index.memberships.get(&id)?;
        index.rooms.get(name).cloned()
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(LobbyConfig::default())
    }
}

/// The `joinedRoom` view for one joiner: their color, everyone else's
/// seat, and the board snapshot while a match is running.
fn joined_room_view(room: &Room, joiner: ParticipantId, color: Color) -> Event {
    let other_participants = room
        .members_except(joiner)
        .iter()
        .map(|s| ParticipantInfo {
            name: s.participant.name.clone(),
            color: s.color,
        })
        .collect();
    Event::to(
        joiner,
        ServerEvent::JoinedRoom {
            room_name: room.name().to_string(),
            room_key: room.key().clone(),
            color,
            other_participants,
            game: room.running_game().map(|g| g.snapshot()),
        },
    )
}
