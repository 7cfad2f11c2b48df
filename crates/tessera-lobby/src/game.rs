//! The grid game: a turn-based tile-claiming match on a rectangular board.
//!
//! Participants take turns claiming one unowned cell each; a color wins by
//! owning four cells that form the corners of a square, axis-aligned or
//! tilted. Owned cells never change hands, and the turn pointer advances
//! only on accepted placements.

use tessera_protocol::{Color, GameSnapshot, OwnedCell, ParticipantId};

use crate::PlaceError;

/// Smallest allowed board dimension. A 3x3 board admits the smallest
/// squares the win rule can form.
pub const MIN_DIMENSION: i32 = 3;

/// Largest allowed board dimension.
pub const MAX_DIMENSION: i32 = 10;

// ---------------------------------------------------------------------------
// Phase and placement outcomes
// ---------------------------------------------------------------------------

/// The lifecycle of a match.
///
/// ```text
///   InProgress ──(placement completes a square)──→ Won
/// ```
///
/// There is no draw state: a full board with no winner simply stays
/// `InProgress` and rejects every further placement, until the owner
/// starts a fresh game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Tiles are being placed.
    InProgress,
    /// This color completed a square; the board is frozen.
    Won(Color),
}

/// What an accepted placement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The placement completed a square; the game is over.
    Win(Color),
    /// Play continues; this color moves next.
    NextTurn(Color),
}

/// An accepted placement: where, by whom, and what happened next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub color: Color,
    pub outcome: PlaceOutcome,
}

// ---------------------------------------------------------------------------
// GridGame
// ---------------------------------------------------------------------------

/// One running (or finished) match.
///
/// The turn order is the room's seat list snapshotted at start time and
/// never changes afterwards: late joiners are spectators of this match,
/// and detached participants keep their slot in the rotation.
#[derive(Debug, Clone)]
pub struct GridGame {
    size_x: i32,
    size_y: i32,
    /// Row-major, `size_x * size_y` cells.
    board: Vec<Option<Color>>,
    turn_order: Vec<(ParticipantId, Color)>,
    /// Index into `turn_order`.
    turn: usize,
    phase: GamePhase,
}

impl GridGame {
    /// Starts a match on a board of the requested size.
    ///
    /// Out-of-range dimensions are clamped into
    /// [[`MIN_DIMENSION`], [`MAX_DIMENSION`]] rather than rejected.
    /// `turn_order` is the seat snapshot, in seating order, and must be
    /// non-empty; the first entry moves first.
    pub fn new(
        size_x: i32,
        size_y: i32,
        turn_order: Vec<(ParticipantId, Color)>,
    ) -> Self {
        let size_x = size_x.clamp(MIN_DIMENSION, MAX_DIMENSION);
        let size_y = size_y.clamp(MIN_DIMENSION, MAX_DIMENSION);
        Self {
            size_x,
            size_y,
            board: vec![None; (size_x * size_y) as usize],
            turn_order,
            turn: 0,
            phase: GamePhase::InProgress,
        }
    }

    /// The clamped board dimensions.
    pub fn size(&self) -> (i32, i32) {
        (self.size_x, self.size_y)
    }

    /// The current phase of the match.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Returns `true` once a color has won.
    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Won(_))
    }

    /// The color whose turn it is.
    pub fn turn_color(&self) -> Color {
        self.turn_order[self.turn].1
    }

    /// The owner of a cell, if any. Out-of-bounds coordinates read as
    /// unowned.
    pub fn cell(&self, x: i32, y: i32) -> Option<Color> {
        self.cell_index(x, y).and_then(|i| self.board[i])
    }

    /// Attempts to claim the cell at `(x, y)` for `by`.
    ///
    /// On success the cell is marked, the win rule is evaluated, and the
    /// match either ends or the turn advances (wrapping). On rejection
    /// nothing changes.
    ///
    /// # Errors
    /// - [`PlaceError::GameOver`] — the match already has a winner
    /// - [`PlaceError::NotSeated`] — `by` is not in the turn order
    /// - [`PlaceError::OutOfTurn`] — it is another color's turn
    /// - [`PlaceError::OutOfBounds`] — `(x, y)` is off the board
    /// - [`PlaceError::CellOwned`] — the cell is already claimed
    pub fn place_tile(
        &mut self,
        x: i32,
        y: i32,
        by: ParticipantId,
    ) -> Result<Placement, PlaceError> {
        if self.is_over() {
            return Err(PlaceError::GameOver);
        }
        if !self.turn_order.iter().any(|(id, _)| *id == by) {
            return Err(PlaceError::NotSeated);
        }
        let (turn_id, color) = self.turn_order[self.turn];
        if by != turn_id {
            return Err(PlaceError::OutOfTurn(color));
        }
        let index = self.cell_index(x, y).ok_or(PlaceError::OutOfBounds)?;
        if self.board[index].is_some() {
            return Err(PlaceError::CellOwned);
        }

        self.board[index] = Some(color);

        if let Some(winner) = square_winner(self.size_x, self.size_y, &self.board) {
            self.phase = GamePhase::Won(winner);
            return Ok(Placement {
                x,
                y,
                color,
                outcome: PlaceOutcome::Win(winner),
            });
        }

        self.turn = (self.turn + 1) % self.turn_order.len();
        Ok(Placement {
            x,
            y,
            color,
            outcome: PlaceOutcome::NextTurn(self.turn_color()),
        })
    }

    /// A wire-ready snapshot of the board, for clients that join or
    /// rejoin mid-match.
    pub fn snapshot(&self) -> GameSnapshot {
        let mut cells = Vec::new();
        for y in 0..self.size_y {
            for x in 0..self.size_x {
                if let Some(color) = self.cell(x, y) {
                    cells.push(OwnedCell { x, y, color });
                }
            }
        }
        GameSnapshot {
            size_x: self.size_x,
            size_y: self.size_y,
            cells,
            turn: self.turn_color(),
        }
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size_x || y >= self.size_y {
            return None;
        }
        Some((y * self.size_x + x) as usize)
    }
}

/// Scans the board for a color owning four cells that form the corners of
/// a square.
///
/// Squares are enumerated by an anchor corner and an edge vector
/// `(dx, dy)` with `dx >= 1, dy >= 0`; the remaining corners follow from
/// rotating the edge by 90 degrees. That canonical form visits every
/// square, axis-aligned or tilted, exactly once. Board sizes are capped
/// at 10x10, so the scan is a few thousand lookups at worst.
fn square_winner(size_x: i32, size_y: i32, board: &[Option<Color>]) -> Option<Color> {
    let at = |x: i32, y: i32| -> Option<Color> {
        if x < 0 || y < 0 || x >= size_x || y >= size_y {
            return None;
        }
        board[(y * size_x + x) as usize]
    };

    let reach = size_x.max(size_y);
    for y in 0..size_y {
        for x in 0..size_x {
            let Some(color) = at(x, y) else { continue };
            for dx in 1..reach {
                for dy in 0..reach {
                    let corners = [
                        (x + dx, y + dy),
                        (x + dx - dy, y + dy + dx),
                        (x - dy, y + dx),
                    ];
                    if corners.iter().all(|&(cx, cy)| at(cx, cy) == Some(color)) {
                        return Some(color);
                    }
                }
            }
        }
    }
    None
}

// =========================================================================
// Tests
// =========================================================================
