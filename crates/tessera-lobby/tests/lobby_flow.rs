//! End-to-end coordination flows: joining, leaving, starting games,
//! placing tiles, and the events each step produces.

use std::sync::Arc;

use tessera_lobby::{Event, Lobby, LobbyConfig, MAX_DIMENSION, MIN_DIMENSION};
use tessera_protocol::{Color, OwnedCell, ParticipantId, RoomKey, ServerEvent};
use tessera_session::Participant;

fn p(id: u64, name: &str) -> Participant {
    Participant {
        id: ParticipantId(id),
        name: name.to_string(),
    }
}

fn lobby() -> Lobby {
    Lobby::new(LobbyConfig::default())
}

/// Every payload addressed to `id`, in dispatch order.
fn sent_to(events: &[Event], id: ParticipantId) -> Vec<&ServerEvent> {
    events
        .iter()
        .filter(|e| e.recipients.contains(&id))
        .map(|e| &e.payload)
        .collect()
}

/// The room key handed to `id` in its `joinedRoom` event.
fn key_for(events: &[Event], id: ParticipantId) -> RoomKey {
    for event in sent_to(events, id) {
        if let ServerEvent::JoinedRoom { room_key, .. } = event {
            return room_key.clone();
        }
    }
    panic!("no joinedRoom event for {id}");
}

/// The seat color handed to `id` in its `joinedRoom` event.
fn color_for(events: &[Event], id: ParticipantId) -> Color {
    for event in sent_to(events, id) {
        if let ServerEvent::JoinedRoom { color, .. } = event {
            return *color;
        }
    }
    panic!("no joinedRoom event for {id}");
}

/// Seats two participants in "alpha" and returns them with the room key.
async fn seated_pair(lobby: &Lobby) -> (Participant, Participant, RoomKey) {
    let red = p(1, "ada");
    let green = p(2, "grace");
    let events = lobby.join_room(&red, "alpha").await;
    let key = key_for(&events, red.id);
    lobby.join_room(&green, "alpha").await;
    (red, green, key)
}

// ============================================================
// Joining
// ============================================================

#[tokio::test]
async fn test_join_room_first_joiner_gets_red_and_an_empty_room_view() {
    let lobby = lobby();
    let ada = p(1, "ada");

    let events = lobby.join_room(&ada, "alpha").await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![ada.id]);
    match &events[0].payload {
        ServerEvent::JoinedRoom {
            room_name,
            room_key,
            color,
            other_participants,
            game,
        } => {
            assert_eq!(room_name, "alpha");
            assert_eq!(room_key.0.len(), 32);
            assert_eq!(*color, Color::Red);
            assert!(other_participants.is_empty());
            assert!(game.is_none());
        }
        other => panic!("expected joinedRoom, got {}", other.kind()),
    }
    assert_eq!(lobby.room_count().await, 1);
}

#[tokio::test]
async fn test_join_room_second_joiner_sees_first_and_first_is_notified() {
    let lobby = lobby();
    let ada = p(1, "ada");
    let grace = p(2, "grace");
    lobby.join_room(&ada, "alpha").await;

    let events = lobby.join_room(&grace, "alpha").await;

    let to_grace = sent_to(&events, grace.id);
    assert_eq!(to_grace.len(), 1);
    match to_grace[0] {
        ServerEvent::JoinedRoom {
            color,
            other_participants,
            ..
        } => {
            assert_eq!(*color, Color::Green);
            assert_eq!(other_participants.len(), 1);
            assert_eq!(other_participants[0].name, "ada");
            assert_eq!(other_participants[0].color, Color::Red);
        }
        other => panic!("expected joinedRoom, got {}", other.kind()),
    }

    let to_ada = sent_to(&events, ada.id);
    assert_eq!(to_ada.len(), 1);
    match to_ada[0] {
        ServerEvent::OtherJoinedRoom { name, color } => {
            assert_eq!(name, "grace");
            assert_eq!(*color, Color::Green);
        }
        other => panic!("expected otherJoinedRoom, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_join_room_full_room_rejects_only_the_latecomer() {
    let lobby = Lobby::new(LobbyConfig { room_capacity: 2 });
    let ada = p(1, "ada");
    let grace = p(2, "grace");
    let edsger = p(3, "edsger");
    lobby.join_room(&ada, "alpha").await;
    lobby.join_room(&grace, "alpha").await;

    let events = lobby.join_room(&edsger, "alpha").await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![edsger.id]);
    assert!(matches!(events[0].payload, ServerEvent::RoomIsFull));
    assert!(sent_to(&events, ada.id).is_empty());
    assert!(sent_to(&events, grace.id).is_empty());
}

#[tokio::test]
async fn test_join_room_while_in_another_room_answers_already_in_room() {
    let lobby = lobby();
    let ada = p(1, "ada");
    lobby.join_room(&ada, "alpha").await;

    let events = lobby.join_room(&ada, "beta").await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, ServerEvent::AlreadyInRoom));
    // The rejected join must not have created "beta".
    assert_eq!(lobby.room_count().await, 1);
    assert_eq!(lobby.current_room(ada.id).await.as_deref(), Some("alpha"));
}

#[tokio::test]
async fn test_join_room_rejoin_resends_view_without_notifying_others() {
    let lobby = lobby();
    let (ada, grace, key) = seated_pair(&lobby).await;

    let events = lobby.join_room(&ada, "alpha").await;

    assert_eq!(events.len(), 1);
    assert!(sent_to(&events, grace.id).is_empty());
    match &events[0].payload {
        ServerEvent::JoinedRoom {
            room_key,
            color,
            other_participants,
            ..
        } => {
            assert_eq!(*room_key, key);
            assert_eq!(*color, Color::Red);
            assert_eq!(other_participants.len(), 1);
            assert_eq!(other_participants[0].name, "grace");
        }
        other => panic!("expected joinedRoom, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_join_room_concurrent_same_name_creates_a_single_room() {
    let lobby = lobby();
    let ada = p(1, "ada");
    let grace = p(2, "grace");

    let (for_ada, for_grace) = tokio::join!(
        lobby.join_room(&ada, "alpha"),
        lobby.join_room(&grace, "alpha"),
    );

    assert_eq!(lobby.room_count().await, 1);
    assert_eq!(key_for(&for_ada, ada.id), key_for(&for_grace, grace.id));
    // Seat order depends on which join wins the race, but the colors
    // must be distinct and drawn from the front of the palette.
    let colors = [color_for(&for_ada, ada.id), color_for(&for_grace, grace.id)];
    assert!(colors.contains(&Color::Red));
    assert!(colors.contains(&Color::Green));
}

// ============================================================
// Leaving
// ============================================================

#[tokio::test]
async fn test_leave_room_notifies_remaining_and_releases_the_color() {
    let lobby = lobby();
    let (ada, grace, key) = seated_pair(&lobby).await;

    let events = lobby.leave_room(&ada, &key).await;

    let to_ada = sent_to(&events, ada.id);
    assert_eq!(to_ada.len(), 1);
    assert!(matches!(
        to_ada[0],
        ServerEvent::LeftRoom { room_key } if *room_key == key
    ));
    let to_grace = sent_to(&events, grace.id);
    assert_eq!(to_grace.len(), 1);
    match to_grace[0] {
        ServerEvent::OtherLeftRoom { room_key, name } => {
            assert_eq!(*room_key, key);
            assert_eq!(name, "ada");
        }
        other => panic!("expected otherLeftRoom, got {}", other.kind()),
    }

    // The freed seat color goes to the next joiner.
    let edsger = p(3, "edsger");
    let events = lobby.join_room(&edsger, "alpha").await;
    assert_eq!(color_for(&events, edsger.id), Color::Red);
}

#[tokio::test]
async fn test_leave_room_with_unknown_key_answers_not_in_room() {
    let lobby = lobby();
    let ada = p(1, "ada");
    lobby.join_room(&ada, "alpha").await;

    let events = lobby
        .leave_room(&ada, &RoomKey("0000000000000000".to_string()))
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, ServerEvent::NotInRoom));
    assert_eq!(lobby.current_room(ada.id).await.as_deref(), Some("alpha"));
}

#[tokio::test]
async fn test_leave_room_with_key_of_another_room_answers_not_in_room() {
    let lobby = lobby();
    let ada = p(1, "ada");
    let grace = p(2, "grace");
    lobby.join_room(&ada, "alpha").await;
    let events = lobby.join_room(&grace, "beta").await;
    let beta_key = key_for(&events, grace.id);

    let events = lobby.leave_room(&ada, &beta_key).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, ServerEvent::NotInRoom));
    // Grace's room is untouched by the failed leave.
    assert_eq!(lobby.current_room(grace.id).await.as_deref(), Some("beta"));
}

#[tokio::test]
async fn test_leave_room_last_member_destroys_the_room() {
    let lobby = lobby();
    let ada = p(1, "ada");
    let events = lobby.join_room(&ada, "alpha").await;
    let first_key = key_for(&events, ada.id);

    lobby.leave_room(&ada, &first_key).await;
    assert_eq!(lobby.room_count().await, 0);

    // Re-creating under the same name yields a fresh room.
    let events = lobby.join_room(&ada, "alpha").await;
    assert_eq!(lobby.room_count().await, 1);
    assert_ne!(key_for(&events, ada.id), first_key);
}

#[tokio::test]
async fn test_leave_room_frees_participant_to_join_elsewhere() {
    let lobby = lobby();
    let ada = p(1, "ada");
    let events = lobby.join_room(&ada, "alpha").await;
    let key = key_for(&events, ada.id);
    lobby.leave_room(&ada, &key).await;

    let events = lobby.join_room(&ada, "beta").await;

    assert_eq!(color_for(&events, ada.id), Color::Red);
    assert_eq!(lobby.current_room(ada.id).await.as_deref(), Some("beta"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leave_room_racing_a_rejoin_keeps_seat_and_membership_aligned() {
    // A resume takeover can issue a leave from the displaced connection
    // and a rejoin from its successor at the same time. Whichever order
    // wins, the seat view and the membership view must agree afterwards:
    // a seat with no membership entry would answer every further request
    // with notInRoom and keep the room from ever emptying.
    let lobby = Arc::new(lobby());
    let ada = p(1, "ada");
    let grace = p(2, "grace");
    lobby.join_room(&grace, "alpha").await;

    for round in 0..50 {
        let events = lobby.join_room(&ada, "alpha").await;
        let key = key_for(&events, ada.id);

        let leaver = Arc::clone(&lobby);
        let joiner = Arc::clone(&lobby);
        let leaving = ada.clone();
        let joining = ada.clone();
        let leave =
            tokio::spawn(async move { leaver.leave_room(&leaving, &key).await });
        let join =
            tokio::spawn(async move { joiner.join_room(&joining, "alpha").await });
        leave.await.unwrap();
        join.await.unwrap();

        let members = lobby
            .room_list()
            .await
            .into_iter()
            .find(|r| r.name == "alpha")
            .map(|r| r.members)
            .unwrap_or(0);
        match lobby.current_room(ada.id).await.as_deref() {
            Some("alpha") => {
                assert_eq!(members, 2, "round {round}: membership kept but seat lost");
            }
            None => {
                assert_eq!(members, 1, "round {round}: seat kept but membership lost");
            }
            Some(other) => panic!("round {round}: seated in unexpected room {other}"),
        }
    }
}

// ============================================================
// Starting games
// ============================================================

#[tokio::test]
async fn test_start_game_outside_any_room_answers_not_in_room() {
    let lobby = lobby();
    let drifter = p(9, "drifter");

    let events = lobby.start_game(&drifter, 5, 5).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![drifter.id]);
    assert!(matches!(events[0].payload, ServerEvent::NotInRoom));
}

#[tokio::test]
async fn test_start_game_by_non_owner_answers_not_owner() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;

    let events = lobby.start_game(&grace, 5, 5).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![grace.id]);
    assert!(matches!(events[0].payload, ServerEvent::NotOwner));
    assert!(sent_to(&events, ada.id).is_empty());
}

#[tokio::test]
async fn test_start_game_broadcasts_start_then_first_turn() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;

    let events = lobby.start_game(&ada, 5, 6).await;

    for id in [ada.id, grace.id] {
        let seen = sent_to(&events, id);
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[0],
            ServerEvent::StartGame { size_x: 5, size_y: 6 }
        ));
        assert!(matches!(
            seen[1],
            ServerEvent::InformTurn { color: Color::Red }
        ));
    }
}

#[tokio::test]
async fn test_start_game_clamps_dimensions_into_bounds() {
    let lobby = lobby();
    let (ada, _, _) = seated_pair(&lobby).await;

    let events = lobby.start_game(&ada, 2, 20).await;

    assert!(matches!(
        sent_to(&events, ada.id)[0],
        ServerEvent::StartGame {
            size_x: MIN_DIMENSION,
            size_y: MAX_DIMENSION,
        }
    ));
}

#[tokio::test]
async fn test_start_game_restart_resets_the_turn_to_the_first_seat() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 5, 5).await;
    lobby.place_tile(&ada, 0, 0).await;

    // After red's move it is green's turn; restarting hands the first
    // turn back to red.
    lobby.start_game(&ada, 5, 5).await;
    let events = lobby.place_tile(&grace, 1, 1).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, ServerEvent::NotYourTurn));
}

// ============================================================
// Placing tiles
// ============================================================

#[tokio::test]
async fn test_place_tile_broadcasts_placement_and_next_turn() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 5, 5).await;

    let events = lobby.place_tile(&ada, 2, 3).await;

    for id in [ada.id, grace.id] {
        let seen = sent_to(&events, id);
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[0],
            ServerEvent::PlacedTile {
                x: 2,
                y: 3,
                color: Color::Red,
            }
        ));
        assert!(matches!(
            seen[1],
            ServerEvent::InformTurn { color: Color::Green }
        ));
    }
}

#[tokio::test]
async fn test_place_tile_out_of_turn_answers_not_your_turn() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 5, 5).await;

    let events = lobby.place_tile(&grace, 0, 0).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![grace.id]);
    assert!(matches!(events[0].payload, ServerEvent::NotYourTurn));
}

#[tokio::test]
async fn test_place_tile_outside_any_room_answers_not_in_room() {
    let lobby = lobby();
    let drifter = p(9, "drifter");

    let events = lobby.place_tile(&drifter, 0, 0).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, ServerEvent::NotInRoom));
}

#[tokio::test]
async fn test_place_tile_without_a_game_is_silently_ignored() {
    let lobby = lobby();
    let (ada, _, _) = seated_pair(&lobby).await;

    let events = lobby.place_tile(&ada, 0, 0).await;

    assert!(events.is_empty());
}

#[tokio::test]
async fn test_place_tile_out_of_bounds_is_ignored_and_keeps_the_turn() {
    let lobby = lobby();
    let (ada, _, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 3, 3).await;

    let events = lobby.place_tile(&ada, 9, 9).await;
    assert!(events.is_empty());

    // The turn did not advance; the same participant may place again.
    let events = lobby.place_tile(&ada, 0, 0).await;
    assert!(matches!(
        sent_to(&events, ada.id)[0],
        ServerEvent::PlacedTile { color: Color::Red, .. }
    ));
}

#[tokio::test]
async fn test_place_tile_on_an_owned_cell_is_ignored_and_keeps_the_turn() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 5, 5).await;
    lobby.place_tile(&ada, 0, 0).await;

    let events = lobby.place_tile(&grace, 0, 0).await;
    assert!(events.is_empty());

    let events = lobby.place_tile(&grace, 1, 1).await;
    assert!(matches!(
        sent_to(&events, grace.id)[0],
        ServerEvent::PlacedTile { color: Color::Green, .. }
    ));
}

#[tokio::test]
async fn test_place_tile_by_late_joiner_answers_observer() {
    let lobby = lobby();
    let (ada, _, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 5, 5).await;

    // Edsger takes a seat mid-match; the turn order is already fixed.
    let edsger = p(3, "edsger");
    lobby.join_room(&edsger, "alpha").await;

    let events = lobby.place_tile(&edsger, 0, 0).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![edsger.id]);
    assert!(matches!(events[0].payload, ServerEvent::Observer));

    // The board and turn are untouched; red still moves first, and the
    // observing member sees the broadcast like anyone else seated.
    let events = lobby.place_tile(&ada, 0, 0).await;
    assert!(matches!(
        sent_to(&events, ada.id)[0],
        ServerEvent::PlacedTile { x: 0, y: 0, color: Color::Red }
    ));
    assert!(!sent_to(&events, edsger.id).is_empty());
}

#[tokio::test]
async fn test_place_tile_completing_a_square_broadcasts_win_game() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 3, 3).await;

    lobby.place_tile(&ada, 0, 0).await;
    lobby.place_tile(&grace, 2, 0).await;
    lobby.place_tile(&ada, 1, 0).await;
    lobby.place_tile(&grace, 2, 1).await;
    lobby.place_tile(&ada, 0, 1).await;
    lobby.place_tile(&grace, 2, 2).await;

    // Red completes the unit square (0,0) (1,0) (0,1) (1,1).
    let events = lobby.place_tile(&ada, 1, 1).await;

    for id in [ada.id, grace.id] {
        let seen = sent_to(&events, id);
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[0],
            ServerEvent::PlacedTile {
                x: 1,
                y: 1,
                color: Color::Red,
            }
        ));
        assert!(matches!(seen[1], ServerEvent::WinGame { color: Color::Red }));
    }

    // The finished match accepts no further placements.
    let events = lobby.place_tile(&grace, 1, 2).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].recipients, vec![grace.id]);
    assert!(matches!(events[0].payload, ServerEvent::GameAlreadyEnded));
}

#[tokio::test]
async fn test_place_tile_after_win_and_restart_plays_normally() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 3, 3).await;
    lobby.place_tile(&ada, 0, 0).await;
    lobby.place_tile(&grace, 2, 0).await;
    lobby.place_tile(&ada, 1, 0).await;
    lobby.place_tile(&grace, 2, 1).await;
    lobby.place_tile(&ada, 0, 1).await;
    lobby.place_tile(&grace, 2, 2).await;
    lobby.place_tile(&ada, 1, 1).await;

    lobby.start_game(&ada, 3, 3).await;
    let events = lobby.place_tile(&ada, 1, 1).await;

    assert!(matches!(
        sent_to(&events, ada.id)[0],
        ServerEvent::PlacedTile {
            x: 1,
            y: 1,
            color: Color::Red,
        }
    ));
    assert!(matches!(
        sent_to(&events, grace.id)[1],
        ServerEvent::InformTurn { color: Color::Green }
    ));
}

// ============================================================
// Rejoin during a running game
// ============================================================

#[tokio::test]
async fn test_rejoin_during_game_carries_the_board_snapshot() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 4, 4).await;
    lobby.place_tile(&ada, 1, 2).await;

    let events = lobby.join_room(&grace, "alpha").await;

    match &events[0].payload {
        ServerEvent::JoinedRoom { game: Some(game), .. } => {
            assert_eq!(game.size_x, 4);
            assert_eq!(game.size_y, 4);
            assert_eq!(
                game.cells,
                vec![OwnedCell {
                    x: 1,
                    y: 2,
                    color: Color::Red,
                }]
            );
            assert_eq!(game.turn, Color::Green);
        }
        other => panic!("expected joinedRoom with snapshot, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_rejoin_after_win_omits_the_snapshot() {
    let lobby = lobby();
    let (ada, grace, _) = seated_pair(&lobby).await;
    lobby.start_game(&ada, 3, 3).await;
    lobby.place_tile(&ada, 0, 0).await;
    lobby.place_tile(&grace, 2, 0).await;
    lobby.place_tile(&ada, 1, 0).await;
    lobby.place_tile(&grace, 2, 1).await;
    lobby.place_tile(&ada, 0, 1).await;
    lobby.place_tile(&grace, 2, 2).await;
    lobby.place_tile(&ada, 1, 1).await;

    let events = lobby.join_room(&grace, "alpha").await;

    assert!(matches!(
        &events[0].payload,
        ServerEvent::JoinedRoom { game: None, .. }
    ));
}

// ============================================================
// Room list
// ============================================================

#[tokio::test]
async fn test_room_list_on_an_empty_lobby_is_empty() {
    let lobby = lobby();
    assert!(lobby.room_list().await.is_empty());
}

#[tokio::test]
async fn test_room_list_reports_members_and_running_games_sorted_by_name() {
    let lobby = lobby();
    let ada = p(1, "ada");
    let grace = p(2, "grace");
    let edsger = p(3, "edsger");
    lobby.join_room(&edsger, "beta").await;
    lobby.join_room(&ada, "alpha").await;
    lobby.join_room(&grace, "alpha").await;
    lobby.start_game(&ada, 5, 5).await;

    let rooms = lobby.room_list().await;

    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].name, "alpha");
    assert_eq!(rooms[0].members, 2);
    assert_eq!(rooms[0].capacity, 10);
    assert!(rooms[0].in_game);
    assert_eq!(rooms[1].name, "beta");
    assert_eq!(rooms[1].members, 1);
    assert!(!rooms[1].in_game);
}
