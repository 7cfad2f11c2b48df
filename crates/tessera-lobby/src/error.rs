//! Error types for the lobby layer.
//!
//! Both errors here are contract errors, not failures: each one maps to a
//! single corrective event for the acting participant (or to a silent
//! drop), and none of them disturbs room or game state.

use tessera_protocol::Color;

/// The room has no free seat (or its color palette is exhausted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("room is full")]
pub struct RoomFull;

/// Why a tile placement was rejected.
///
/// Rejections mutate nothing: the board, the turn pointer, and the phase
/// are exactly as they were before the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    /// The game already has a winner.
    #[error("the game has already ended")]
    GameOver,

    /// It is another color's turn.
    #[error("placement out of turn, it is {0}'s turn")]
    OutOfTurn(Color),

    /// The coordinates fall outside the board.
    #[error("coordinates outside the board")]
    OutOfBounds,

    /// The cell is already owned; owned cells never change hands.
    #[error("cell already owned")]
    CellOwned,

    /// The participant is not part of this game's turn order.
    #[error("participant is not seated in this game")]
    NotSeated,
}
