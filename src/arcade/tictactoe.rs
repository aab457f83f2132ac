//! Tic-tac-toe against a random opponent
//!
//! The player is always `X` and moves first; the opponent `O` answers on a
//! uniformly random empty cell. Once a line is completed or the board fills
//! up, the game is terminal and refuses moves until [`TicTacToe::reset`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::MoveError;

/// The 8 winning lines: rows, columns, diagonals
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub const CELLS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "winner", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won(Mark),
    Draw,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicTacToe {
    board: [Option<Mark>; CELLS],
    turn: Mark,
    status: GameStatus,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            board: [None; CELLS],
            turn: Mark::X,
            status: GameStatus::InProgress,
        }
    }

    pub fn board(&self) -> &[Option<Mark>; CELLS] {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Whose move is expected next
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// True while the opponent owes a reply
    pub fn awaiting_opponent(&self) -> bool {
        self.status == GameStatus::InProgress && self.turn == Mark::O
    }

    /// Place the player's `X`
    pub fn play(&mut self, cell: usize) -> Result<GameStatus, MoveError> {
        self.place(cell, Mark::X)
    }

    /// Place the opponent's `O` on a specific cell
    pub fn opponent_play(&mut self, cell: usize) -> Result<GameStatus, MoveError> {
        self.place(cell, Mark::O)
    }

    /// Let the opponent pick a random empty cell
    ///
    /// Returns the chosen cell, or `None` when no reply is owed.
    pub fn opponent_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        if !self.awaiting_opponent() {
            return None;
        }

        let cell = *self.empty_cells().choose(rng)?;
        self.place(cell, Mark::O).ok().map(|_| cell)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELLS).filter(|&i| self.board[i].is_none()).collect()
    }

    fn place(&mut self, cell: usize, mark: Mark) -> Result<GameStatus, MoveError> {
        if self.status.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if mark != self.turn {
            return Err(MoveError::NotYourTurn);
        }
        let slot = self
            .board
            .get_mut(cell)
            .ok_or(MoveError::OutOfRange(cell))?;
        if slot.is_some() {
            return Err(MoveError::Occupied(cell));
        }

        *slot = Some(mark);
        self.status = self.evaluate();
        self.turn = match mark {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        };
        Ok(self.status)
    }

    fn evaluate(&self) -> GameStatus {
        for [a, b, c] in LINES {
            if let Some(mark) = self.board[a] {
                if self.board[b] == Some(mark) && self.board[c] == Some(mark) {
                    return GameStatus::Won(mark);
                }
            }
        }

        if self.board.iter().all(Option::is_some) {
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        }
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}
